//! Value escaping.
//!
//! Command building never splices a user value into SQL directly: every value
//! passes through an [`Escaper`]. A connection supplies the escaper backed by
//! its engine's own formatting primitive; [`StandardEscaper`] implements the
//! same quote-doubling rules without an engine and is what
//! [`CommandBuilder::standard`](crate::CommandBuilder::standard) uses.

use quillite_core::{Error, InvariantKind, Result};

/// Quote-safe rendering of text for inclusion in SQL.
pub trait Escaper {
    /// Render text for use inside a single-quoted literal: every `'` is doubled.
    ///
    /// This is the `%q` conversion.
    fn escape_text(&self, text: &str) -> Result<String>;

    /// Render text as a complete single-quoted literal.
    ///
    /// This is the `%Q` conversion (NULL handling is done by the caller).
    fn quote_text(&self, text: &str) -> Result<String> {
        Ok(format!("'{}'", self.escape_text(text)?))
    }

    /// Render text for use inside a double-quoted identifier: every `"` is doubled.
    ///
    /// This is the `%w` conversion.
    fn escape_ident(&self, ident: &str) -> Result<String>;
}

impl<E: Escaper + ?Sized> Escaper for &E {
    fn escape_text(&self, text: &str) -> Result<String> {
        (**self).escape_text(text)
    }

    fn quote_text(&self, text: &str) -> Result<String> {
        (**self).quote_text(text)
    }

    fn escape_ident(&self, ident: &str) -> Result<String> {
        (**self).escape_ident(ident)
    }
}

/// Engine-independent escaper using SQL quote doubling.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEscaper;

impl Escaper for StandardEscaper {
    fn escape_text(&self, text: &str) -> Result<String> {
        reject_nul(text)?;
        Ok(text.replace('\'', "''"))
    }

    fn escape_ident(&self, ident: &str) -> Result<String> {
        reject_nul(ident)?;
        Ok(ident.replace('"', "\"\""))
    }
}

/// Engines read values as C strings, so a NUL byte would silently truncate
/// the command.
pub fn reject_nul(text: &str) -> Result<()> {
    if text.contains('\0') {
        return Err(Error::invariant(
            InvariantKind::MalformedFilter,
            "argument contains a NUL byte",
        ));
    }
    Ok(())
}
