//! Quillite - typed, injection-safe SQL commands over embedded SQLite.
//!
//! Quillite describes tables with [`Table`] and [`Column`], filters with a
//! printf-style template and positional arguments, and executes the resulting
//! commands on a single [`SqliteConnection`]:
//!
//! - Every value reaches SQL through SQLite's own quoting (`%q` / `%Q` / `%w`);
//!   a bare `%s` in a filter template is quoted as well.
//! - Results come back as a [`QueryResult`] of text [`Row`]s. A constraint
//!   violation is a normal outcome; every other failure is an
//!   [`InvariantViolation`].
//! - Transactions are scoped: the last [`Transaction`] handle to go away
//!   commits with `END TRANSACTION;`.
//!
//! # Quick Start
//!
//! ```ignore
//! use quillite::prelude::*;
//!
//! let conn = SqliteConnection::open_memory()?;
//! let users = Table::new(
//!     "users",
//!     vec![
//!         Column::with_declaration("id", "INTEGER PRIMARY KEY").into(),
//!         Column::with_declaration("name", "TEXT").into(),
//!     ],
//! );
//! conn.create(&users)?;
//!
//! {
//!     let _tx = conn.immediate_transaction()?;
//!     conn.insert(&users, &Row::new().with("id", "1").with("name", "O'Brien"))?;
//! }
//!
//! let result = conn.select(&users, &filter!("name='%s'", "O'Brien"))?;
//! assert_eq!(result.first().unwrap().get_int("id")?, 1);
//!
//! let dup = conn.insert(&users, &Row::new().with("id", "1"))?;
//! assert!(dup.is_constraint_violation());
//! ```
//!
//! # Fail-fast hosts
//!
//! The library returns every invariant violation as an `Err`. A host that
//! wants such errors to stop the program can call [`FailFast::or_abort`] on
//! what it gets back.

pub use quillite_core::{
    Arg, Column, ColumnName, ConfigError, ConnectionError, ConnectionErrorKind, Error, FailFast,
    InvariantKind, InvariantViolation, QueryResult, Result, ResultCode, Row, Table, TypeError,
};
pub use quillite_core::identifiers::is_plain_identifier;
pub use quillite_query::{ALWAYS_TRUE, CommandBuilder, Escaper, Filter, StandardEscaper, filter};
pub use quillite_sqlite::{
    DEFAULT_BUSY_TIMEOUT_MS, OpenFlags, SqliteConfig, SqliteConnection, SqliteEscaper, Strength,
    Transaction, sqlite_version, sqlite_version_number,
};

/// Everything needed for day-to-day use.
///
/// ```ignore
/// use quillite::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Column, Error, FailFast, Filter, InvariantKind, QueryResult, Result, ResultCode, Row,
        SqliteConfig, SqliteConnection, Strength, Table, Transaction, filter,
    };
}
