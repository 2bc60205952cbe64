//! WHERE-clause filters.

use crate::escape::Escaper;
use crate::format;
use quillite_core::{Arg, Result};
use serde::{Deserialize, Serialize};

/// The always-true expression used when no filter is given.
pub const ALWAYS_TRUE: &str = "'true'='true'";

/// A WHERE-clause template plus its positional arguments.
///
/// Build one with [`Filter::new`] and [`Filter::arg`], or with the
/// [`filter!`](crate::filter!) macro:
///
/// ```
/// use quillite_query::{StandardEscaper, filter};
///
/// let f = filter!("name='%s' AND age > %d", "O'Brien", 30);
/// assert_eq!(f.render(&StandardEscaper).unwrap(), "name='O''Brien' AND age > 30");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    template: String,
    #[serde(default)]
    args: Vec<Arg>,
}

impl Filter {
    /// A filter with no arguments.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            args: Vec::new(),
        }
    }

    /// A filter with its arguments.
    pub fn with_args(template: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            template: template.into(),
            args,
        }
    }

    /// The filter that matches every row: `'true'='true'`.
    pub fn all() -> Self {
        Self::new(ALWAYS_TRUE)
    }

    /// Append the next positional argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Render the WHERE expression through `escaper`.
    pub fn render<E: Escaper + ?Sized>(&self, escaper: &E) -> Result<String> {
        format::render(escaper, &self.template, &self.args)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::all()
    }
}

/// Build a [`Filter`] from a template and positional arguments.
///
/// Each argument is converted with `Arg::from`.
#[macro_export]
macro_rules! filter {
    ($template:expr $(,)?) => {
        $crate::Filter::new($template)
    };
    ($template:expr, $($arg:expr),+ $(,)?) => {
        $crate::Filter::with_args($template, vec![$($crate::Arg::from($arg)),+])
    };
}
