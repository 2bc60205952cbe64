//! SQLite connection for Quillite.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! This crate owns the engine handle. It runs the commands built by
//! `quillite-query`, collects their records into a
//! [`QueryResult`](quillite_core::QueryResult), and hands out scoped
//! [`Transaction`]s.
//!
//! # Features
//!
//! - Select, count, insert, replace, remove, clear and create on a [`Table`](quillite_core::Table)
//! - Values escaped by SQLite's own `%q` / `%Q` / `%w` formatter
//! - Deferred, immediate and exclusive transactions that commit when the
//!   last handle is released
//! - In-memory and file-based databases with configurable open flags and
//!   busy timeout
//!
//! # Example
//!
//! ```rust,ignore
//! use quillite_sqlite::SqliteConnection;
//! use quillite_core::{Column, Row, Table};
//! use quillite_query::filter;
//!
//! let conn = SqliteConnection::open_memory()?;
//! let users = Table::new("users", vec![Column::shared("id"), Column::shared("name")]);
//! conn.create(&users)?;
//!
//! {
//!     let _tx = conn.immediate_transaction()?;
//!     conn.insert(&users, &Row::new().with("id", "1").with("name", "Alice"))?;
//! } // END TRANSACTION;
//!
//! let result = conn.select(&users, &filter!("name='%s'", "Alice"))?;
//! assert_eq!(result.len(), 1);
//! ```
//!
//! # Thread Safety
//!
//! `SqliteConnection` is neither `Send` nor `Sync`. Use one connection per
//! database file per process, from one thread.

pub mod connection;
pub mod escape;
pub mod ffi;
pub mod transaction;

pub use connection::{DEFAULT_BUSY_TIMEOUT_MS, OpenFlags, SqliteConfig, SqliteConnection};
pub use escape::SqliteEscaper;
pub use transaction::{Strength, Transaction};

/// Re-export the SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// Re-export the SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}
