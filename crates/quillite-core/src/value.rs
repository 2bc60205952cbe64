//! Filter arguments.

use serde::{Deserialize, Serialize};

/// One positional argument substituted into a filter template.
///
/// This replaces the C-style variadic list: a filter is a template plus an
/// ordered `Vec<Arg>`, and every argument is rendered through the engine's
/// escaper when the command is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Arg {
    /// NULL value
    Null,

    /// Boolean value, rendered as 0/1
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Text string
    Text(String),
}

impl Arg {
    /// Check if this argument is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Arg::Null)
    }

    /// Get the type name of this argument.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Arg::Null => "NULL",
            Arg::Bool(_) => "BOOLEAN",
            Arg::Int(_) => "INTEGER",
            Arg::Float(_) => "REAL",
            Arg::Text(_) => "TEXT",
        }
    }

    /// Try to convert this argument to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Arg::Int(v) => Some(*v),
            Arg::Bool(v) => Some(if *v { 1 } else { 0 }),
            _ => None,
        }
    }

    /// Try to convert this argument to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Float(v) => Some(*v),
            Arg::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get this argument as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(i64::from(v))
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<u32> for Arg {
    fn from(v: u32) -> Self {
        Arg::Int(i64::from(v))
    }
}

impl From<usize> for Arg {
    fn from(v: usize) -> Self {
        i64::try_from(v).map_or_else(
            |_| {
                tracing::warn!(
                    value = v,
                    clamped_to = i64::MAX,
                    "usize argument exceeds i64::MAX; clamping to i64::MAX"
                );
                Arg::Int(i64::MAX)
            },
            Arg::Int,
        )
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Text(v)
    }
}

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Arg::Text(v.clone())
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        v.map_or(Arg::Null, Into::into)
    }
}
