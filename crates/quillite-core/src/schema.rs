//! Table and column descriptors.

use crate::Result;
use crate::error::{Error, InvariantKind};
use crate::identifiers::is_plain_identifier;
use std::collections::HashSet;
use std::sync::Arc;

/// A named column.
///
/// Columns are immutable and usually shared between tables through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: String,
    /// SQL type and constraints emitted after the name in CREATE TABLE
    declaration: Option<String>,
}

impl Column {
    /// Create an untyped column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaration: None,
        }
    }

    /// Create a column carrying a type/constraint declaration,
    /// e.g. `Column::with_declaration("id", "INTEGER PRIMARY KEY")`.
    pub fn with_declaration(name: impl Into<String>, declaration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaration: Some(declaration.into()),
        }
    }

    /// Shorthand for `Arc::new(Column::new(name))`.
    pub fn shared(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaration(&self) -> Option<&str> {
        self.declaration.as_deref()
    }

    /// The column definition used by CREATE TABLE.
    pub fn definition(&self) -> String {
        match &self.declaration {
            Some(decl) => format!("{} {}", self.name, decl),
            None => self.name.clone(),
        }
    }
}

/// Anything that names a column: a `Column`, a shared `Arc<Column>`, or a
/// plain string.
pub trait ColumnName {
    fn column_name(&self) -> &str;
}

impl ColumnName for Column {
    fn column_name(&self) -> &str {
        &self.name
    }
}

impl ColumnName for Arc<Column> {
    fn column_name(&self) -> &str {
        &self.name
    }
}

impl ColumnName for str {
    fn column_name(&self) -> &str {
        self
    }
}

impl ColumnName for String {
    fn column_name(&self) -> &str {
        self
    }
}

impl<T: ColumnName + ?Sized> ColumnName for &T {
    fn column_name(&self) -> &str {
        (**self).column_name()
    }
}

/// A named, ordered set of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<Arc<Column>>,
}

impl Table {
    /// Create a table. Column order is declaration order.
    ///
    /// Column names are not checked for uniqueness here; see [`Table::validate`].
    pub fn new(name: impl Into<String>, columns: Vec<Arc<Column>>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Arc<Column>] {
        &self.columns
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&Arc<Column>> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    /// Check that the table and column names are plain identifiers and that
    /// column names are unique.
    ///
    /// Command building never calls this; it is offered to callers that
    /// construct schemas from untrusted input.
    pub fn validate(&self) -> Result<()> {
        if !is_plain_identifier(&self.name) {
            return Err(Error::invariant(
                InvariantKind::InvalidIdentifier,
                format!("table name '{}' is not a plain identifier", self.name),
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !is_plain_identifier(column.name()) {
                return Err(Error::invariant(
                    InvariantKind::InvalidIdentifier,
                    format!(
                        "column name '{}' in table '{}' is not a plain identifier",
                        column.name(),
                        self.name
                    ),
                ));
            }
            if !seen.insert(column.name()) {
                return Err(Error::invariant(
                    InvariantKind::InvalidIdentifier,
                    format!(
                        "column '{}' appears twice in table '{}'",
                        column.name(),
                        self.name
                    ),
                ));
            }
        }

        Ok(())
    }
}
