//! Database row representation.

use crate::Result;
use crate::error::{Error, InvariantKind, TypeError};
use serde::Serialize;
use std::collections::HashMap;

/// A single record: an ordered set of column names and their text values.
///
/// The engine reports every value as text. A column that is absent from the
/// row was either NULL or never reported, which is different from a column
/// that is present with an empty string; use [`Row::get`] to tell the two
/// apart.
///
/// Text the engine returns that is not valid UTF-8 is stored with the bad
/// bytes replaced by U+FFFD; the connection logs a warning when that happens.
///
/// Rows are also how callers describe the values of an INSERT or REPLACE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Column names in insertion order
    columns: Vec<String>,
    /// Name -> value
    values: HashMap<String, String>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs, keeping their order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.set(column, value);
        }
        row
    }

    /// Set a column's value.
    ///
    /// A new column is appended; an existing one keeps its position.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        if !self.values.contains_key(&column) {
            self.columns.push(column.clone());
        }
        self.values.insert(column, value.into());
    }

    /// Builder form of [`Row::set`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    /// Get the number of columns in this row.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if this row is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Check if a column exists by name.
    pub fn contains_column(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Get a value by column name, `None` when the column is absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Get a value by column name.
    ///
    /// Asking for a column the row does not hold is a caller bug and is
    /// reported as [`InvariantKind::MissingColumn`].
    pub fn get_str(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            tracing::error!(column = name, "unable to find column");
            Error::invariant(
                InvariantKind::MissingColumn,
                format!("unable to find column '{}'", name),
            )
        })
    }

    /// Parse a value as an unsigned integer.
    pub fn get_uint(&self, name: &str) -> Result<u64> {
        let raw = self.get_str(name)?;
        raw.trim()
            .parse()
            .map_err(|_| type_error("unsigned integer", raw, name))
    }

    /// Parse a value as a signed integer.
    pub fn get_int(&self, name: &str) -> Result<i64> {
        let raw = self.get_str(name)?;
        raw.trim()
            .parse()
            .map_err(|_| type_error("integer", raw, name))
    }

    /// Parse a value as a boolean. Only `0` and `1` are accepted.
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.get_uint(name) {
            Ok(0) => Ok(false),
            Ok(1) => Ok(true),
            Ok(other) => Err(type_error("boolean (0 or 1)", &other.to_string(), name)),
            Err(Error::Type(mut te)) => {
                te.expected = "boolean (0 or 1)";
                Err(Error::Type(te))
            }
            Err(e) => Err(e),
        }
    }

    /// Iterate over (column_name, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .filter_map(|c| self.values.get(c).map(|v| (c.as_str(), v.as_str())))
    }

    /// A JSON object view of this row.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

fn type_error(expected: &'static str, actual: &str, column: &str) -> Error {
    Error::Type(TypeError {
        expected,
        actual: actual.to_string(),
        column: Some(column.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_first_insertion_order() {
        let mut row = Row::new().with("b", "2").with("a", "1");
        row.set("b", "3");
        assert_eq!(row.columns(), &["b".to_string(), "a".to_string()]);
        assert_eq!(row.get("b"), Some("3"));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn absent_differs_from_empty() {
        let row = Row::from_pairs([("email", "")]);
        assert_eq!(row.get("email"), Some(""));
        assert_eq!(row.get("phone"), None);
        assert!(row.contains_column("email"));
        assert!(!row.contains_column("phone"));
    }

    #[test]
    fn missing_column_is_invariant_violation() {
        let row = Row::new();
        let err = row.get_str("id").unwrap_err();
        assert_eq!(err.invariant_kind(), Some(InvariantKind::MissingColumn));
    }

    #[test]
    fn typed_accessors() {
        let row = Row::from_pairs([("n", "42"), ("neg", "-3"), ("flag", "1"), ("off", "0")]);
        assert_eq!(row.get_uint("n").unwrap(), 42);
        assert_eq!(row.get_int("neg").unwrap(), -3);
        assert!(row.get_bool("flag").unwrap());
        assert!(!row.get_bool("off").unwrap());
    }

    #[test]
    fn typed_accessor_failures() {
        let row = Row::from_pairs([("neg", "-3"), ("two", "2"), ("word", "yes")]);

        let err = row.get_uint("neg").unwrap_err();
        assert!(matches!(err, Error::Type(_)));

        let err = row.get_bool("two").unwrap_err();
        assert!(err.to_string().contains("boolean"));

        let err = row.get_bool("word").unwrap_err();
        match err {
            Error::Type(te) => {
                assert_eq!(te.expected, "boolean (0 or 1)");
                assert_eq!(te.column.as_deref(), Some("word"));
            }
            other => panic!("expected type error, got {other:?}"),
        }

        let err = row.get_bool("missing").unwrap_err();
        assert_eq!(err.invariant_kind(), Some(InvariantKind::MissingColumn));
    }

    #[test]
    fn json_view() {
        let row = Row::from_pairs([("z", "1"), ("a", "x")]);
        let json = row.to_json();
        assert_eq!(json["z"], "1");
        assert_eq!(json["a"], "x");
        assert!(json.get("b").is_none());
    }
}
