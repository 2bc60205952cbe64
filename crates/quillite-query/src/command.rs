//! SQL command synthesis.
//!
//! Every command has one fixed shape:
//!
//! | Operation | Command |
//! |-----------|---------|
//! | select | `SELECT <cols> FROM <table> WHERE <filter>;` |
//! | count | `SELECT COUNT(<c1>), COUNT(<c2>) FROM <table> WHERE <filter>;` |
//! | insert | `INSERT INTO <table> (<cols>) VALUES (<vals>);` |
//! | replace | `UPDATE <table> SET <col>='<val>', .. WHERE <filter>;` |
//! | delete | `DELETE FROM <table> WHERE <filter>;` |
//! | clear | `UPDATE <table> SET <col>=NULL, .. WHERE <filter>;` |
//! | create | `CREATE TABLE IF NOT EXISTS <table> (<col1>, <col2>);` |
//!
//! Table names, and column names in SELECT, COUNT and CREATE, are spliced in
//! as given; callers are responsible for passing valid identifiers (see
//! `Table::validate`). The write commands (INSERT, replace, clear) run their
//! column names through `escape_text`. Every value, whether a
//! row value or a filter argument, goes through the [`Escaper`].
//!
//! Column sets must not be empty: an empty SELECT, COUNT, INSERT or clear list
//! produces malformed SQL and the engine will reject it.

use crate::escape::{Escaper, StandardEscaper};
use crate::filter::Filter;
use quillite_core::{ColumnName, Result, Row, Table};

/// Builds escaped command strings.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder<E = StandardEscaper> {
    escaper: E,
}

impl CommandBuilder<StandardEscaper> {
    /// A builder that escapes with [`StandardEscaper`].
    pub fn standard() -> Self {
        Self {
            escaper: StandardEscaper,
        }
    }
}

impl<E: Escaper> CommandBuilder<E> {
    pub fn new(escaper: E) -> Self {
        Self { escaper }
    }

    pub fn escaper(&self) -> &E {
        &self.escaper
    }

    /// SELECT every column of `table`.
    pub fn select(&self, table: &Table, filter: &Filter) -> Result<String> {
        self.select_columns(table, table.columns(), filter)
    }

    /// SELECT a subset of columns.
    #[tracing::instrument(level = "trace", skip_all, fields(table = table.name()))]
    pub fn select_columns<C: ColumnName>(
        &self,
        table: &Table,
        columns: &[C],
        filter: &Filter,
    ) -> Result<String> {
        let column_spec = join(columns.iter().map(|c| c.column_name().to_string()));
        let query = filter.render(&self.escaper)?;
        Ok(format!(
            "SELECT {} FROM {} WHERE {};",
            column_spec,
            table.name(),
            query
        ))
    }

    /// COUNT every column of `table`.
    pub fn count(&self, table: &Table, filter: &Filter) -> Result<String> {
        self.count_columns(table, table.columns(), filter)
    }

    /// COUNT a subset of columns. Each column yields one `COUNT(<name>)` value.
    #[tracing::instrument(level = "trace", skip_all, fields(table = table.name()))]
    pub fn count_columns<C: ColumnName>(
        &self,
        table: &Table,
        columns: &[C],
        filter: &Filter,
    ) -> Result<String> {
        let column_spec = join(
            columns
                .iter()
                .map(|c| format!("COUNT({})", c.column_name())),
        );
        let query = filter.render(&self.escaper)?;
        Ok(format!(
            "SELECT {} FROM {} WHERE {};",
            column_spec,
            table.name(),
            query
        ))
    }

    /// INSERT one row. Columns and values follow the row's column order.
    #[tracing::instrument(level = "trace", skip_all, fields(table = table.name()))]
    pub fn insert(&self, table: &Table, row: &Row) -> Result<String> {
        let mut names = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (column, value) in row.iter() {
            names.push(self.escaper.escape_text(column)?);
            values.push(self.escaper.quote_text(value)?);
        }
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({});",
            table.name(),
            join(names),
            join(values)
        ))
    }

    /// UPDATE the row's columns to the row's values wherever `filter` matches.
    #[tracing::instrument(level = "trace", skip_all, fields(table = table.name()))]
    pub fn replace(&self, table: &Table, row: &Row, filter: &Filter) -> Result<String> {
        let mut assignments = Vec::with_capacity(row.len());
        for (column, value) in row.iter() {
            assignments.push(format!(
                "{}={}",
                self.escaper.escape_text(column)?,
                self.escaper.quote_text(value)?
            ));
        }
        let query = filter.render(&self.escaper)?;
        Ok(format!(
            "UPDATE {} SET {} WHERE {};",
            table.name(),
            join(assignments),
            query
        ))
    }

    /// DELETE wherever `filter` matches.
    #[tracing::instrument(level = "trace", skip_all, fields(table = table.name()))]
    pub fn delete(&self, table: &Table, filter: &Filter) -> Result<String> {
        let query = filter.render(&self.escaper)?;
        Ok(format!("DELETE FROM {} WHERE {};", table.name(), query))
    }

    /// Set `columns` to NULL wherever `filter` matches.
    #[tracing::instrument(level = "trace", skip_all, fields(table = table.name()))]
    pub fn clear<C: ColumnName>(
        &self,
        table: &Table,
        columns: &[C],
        filter: &Filter,
    ) -> Result<String> {
        let mut assignments = Vec::with_capacity(columns.len());
        for column in columns {
            assignments.push(format!("{}=NULL", self.escaper.escape_text(column.column_name())?));
        }
        let assignments = join(assignments);
        let query = filter.render(&self.escaper)?;
        Ok(format!(
            "UPDATE {} SET {} WHERE {};",
            table.name(),
            assignments,
            query
        ))
    }

    /// CREATE TABLE IF NOT EXISTS with every column's definition.
    pub fn create(&self, table: &Table) -> String {
        let columns = join(table.columns().iter().map(|c| c.definition()));
        format!("CREATE TABLE IF NOT EXISTS {} ({});", table.name(), columns)
    }
}

fn join<I: IntoIterator<Item = String>>(parts: I) -> String {
    parts.into_iter().collect::<Vec<_>>().join(", ")
}
