//! Printf-style filter substitution.
//!
//! A filter is a template such as `"name='%s' AND age > %d"` plus an ordered
//! list of [`Arg`]s. Rendering happens in two steps:
//!
//! 1. [`to_safe_template`] rewrites every `%s` to `%q`, so plain string
//!    placeholders can never bypass quoting.
//! 2. [`substitute`] walks the safe template and renders each placeholder
//!    through the [`Escaper`].
//!
//! | Placeholder | Renders |
//! |-------------|---------|
//! | `%q` | text with `'` doubled, no surrounding quotes; NULL as `(NULL)` |
//! | `%Q` | `'text'` with `'` doubled, or bare `NULL` |
//! | `%w` | identifier text with `"` doubled |
//! | `%d` `%i` `%u` (`l`/`ll` allowed) | decimal integer |
//! | `%f` `%.Nf` | fixed point, 6 or N decimals |
//! | `%g` | shortest decimal |
//! | `%%` | `%` |

use crate::escape::Escaper;
use quillite_core::{Arg, Error, InvariantKind, Result};
use std::borrow::Cow;

/// Rewrite every `%s` placeholder to `%q`. `%%` escapes are left alone.
pub fn to_safe_template(template: &str) -> Cow<'_, str> {
    if !template.contains("%s") {
        return Cow::Borrowed(template);
    }

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        out.push(c);
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some('s') => out.push('q'),
            Some(next) => out.push(next),
            None => {}
        }
    }
    Cow::Owned(out)
}

/// Render a filter template with its arguments.
#[tracing::instrument(level = "trace", skip(escaper, args))]
pub fn render<E: Escaper + ?Sized>(escaper: &E, template: &str, args: &[Arg]) -> Result<String> {
    substitute(escaper, &to_safe_template(template), args)
}

/// Substitute arguments into an already-safe template.
pub fn substitute<E: Escaper + ?Sized>(escaper: &E, template: &str, args: &[Arg]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter().enumerate();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let placeholder = parse_placeholder(&mut chars, template)?;
        if placeholder.conversion == '%' {
            out.push('%');
            continue;
        }

        let Some((index, arg)) = args.next() else {
            return Err(malformed(
                template,
                format!("missing argument for placeholder %{}", placeholder.conversion),
            ));
        };
        out.push_str(&render_one(escaper, &placeholder, index, arg, template)?);
    }

    let extra = args.count();
    if extra > 0 {
        return Err(malformed(
            template,
            format!("{} argument(s) left over after substitution", extra),
        ));
    }

    Ok(out)
}

#[derive(Debug)]
struct Placeholder {
    precision: Option<usize>,
    long: bool,
    conversion: char,
}

fn parse_placeholder(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    template: &str,
) -> Result<Placeholder> {
    let mut precision = None;
    if chars.peek() == Some(&'.') {
        chars.next();
        let mut digits = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(d);
            chars.next();
        }
        precision = Some(
            digits
                .parse()
                .map_err(|_| malformed(template, "precision must be a number"))?,
        );
    }

    let mut long = false;
    for _ in 0..2 {
        if chars.peek() == Some(&'l') {
            chars.next();
            long = true;
        }
    }

    let conversion = chars
        .next()
        .ok_or_else(|| malformed(template, "template ends with a dangling '%'"))?;

    let placeholder = Placeholder {
        precision,
        long,
        conversion,
    };

    let precision_ok = placeholder.precision.is_none() || placeholder.conversion == 'f';
    let long_ok = !placeholder.long || matches!(placeholder.conversion, 'd' | 'i' | 'u');
    if !precision_ok || !long_ok {
        return Err(malformed(
            template,
            format!("unsupported modifiers on %{}", placeholder.conversion),
        ));
    }

    Ok(placeholder)
}

fn render_one<E: Escaper + ?Sized>(
    escaper: &E,
    placeholder: &Placeholder,
    index: usize,
    arg: &Arg,
    template: &str,
) -> Result<String> {
    let mismatch = || {
        malformed(
            template,
            format!(
                "argument {} ({}) does not fit placeholder %{}",
                index + 1,
                arg.type_name(),
                placeholder.conversion
            ),
        )
    };

    match placeholder.conversion {
        'q' => match arg {
            Arg::Null => Ok("(NULL)".to_string()),
            _ => escaper.escape_text(&text_form(arg)),
        },
        'Q' => match arg {
            Arg::Null => Ok("NULL".to_string()),
            _ => escaper.quote_text(&text_form(arg)),
        },
        'w' => match arg {
            Arg::Text(s) => escaper.escape_ident(s),
            _ => Err(mismatch()),
        },
        'd' | 'i' => arg.as_i64().map(|v| v.to_string()).ok_or_else(mismatch),
        'u' => arg
            .as_i64()
            .and_then(|v| u64::try_from(v).ok())
            .map(|v| v.to_string())
            .ok_or_else(mismatch),
        'f' => finite(arg, template)?
            .map(|v| format!("{:.*}", placeholder.precision.unwrap_or(6), v))
            .ok_or_else(mismatch),
        'g' => finite(arg, template)?
            .map(|v| v.to_string())
            .ok_or_else(mismatch),
        other => Err(malformed(
            template,
            format!("unknown placeholder %{}", other),
        )),
    }
}

/// NaN and infinities have no SQL literal form.
fn finite(arg: &Arg, template: &str) -> Result<Option<f64>> {
    match arg.as_f64() {
        Some(v) if !v.is_finite() => Err(malformed(
            template,
            format!("non-finite number {} has no SQL literal", v),
        )),
        other => Ok(other),
    }
}

fn text_form(arg: &Arg) -> String {
    match arg {
        Arg::Null => String::new(),
        Arg::Bool(v) => String::from(if *v { "1" } else { "0" }),
        Arg::Int(v) => v.to_string(),
        Arg::Float(v) => v.to_string(),
        Arg::Text(s) => s.clone(),
    }
}

fn malformed(template: &str, message: impl Into<String>) -> Error {
    let message = message.into();
    tracing::error!(template, message = %message, "malformed filter");
    Error::invariant(
        InvariantKind::MalformedFilter,
        format!("{} in filter '{}'", message, template),
    )
}
