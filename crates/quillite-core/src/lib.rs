//! Core types for Quillite.
//!
//! This crate holds the engine-independent pieces:
//!
//! - `Table` / `Column` schema descriptors
//! - `Row` and `QueryResult`, the materialized output of a command
//! - `Arg`, one positional filter argument
//! - the `Error` taxonomy, separating invariant violations from normal outcomes

pub mod error;
pub mod identifiers;
pub mod result;
pub mod row;
pub mod schema;
pub mod value;

pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, FailFast, InvariantKind,
    InvariantViolation, Result, TypeError,
};
pub use result::{QueryResult, ResultCode};
pub use row::Row;
pub use schema::{Column, ColumnName, Table};
pub use value::Arg;
