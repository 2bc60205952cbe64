//! SQLite connection.
//!
//! A [`SqliteConnection`] owns one engine handle. It turns table operations
//! into commands through a [`CommandBuilder`] that escapes with the engine's
//! own formatter, runs them with `sqlite3_exec`, and collects one [`Row`] per
//! record the engine reports.
//!
//! Only two outcomes come back as a [`QueryResult`]: success and constraint
//! violation. Any other engine code is returned as an
//! [`InvariantKind::EngineFailure`] carrying the code, the engine message and
//! the command.
//!
//! ```rust,ignore
//! use quillite_sqlite::SqliteConnection;
//! use quillite_core::{Column, Row, Table};
//! use quillite_query::Filter;
//!
//! let conn = SqliteConnection::open_memory()?;
//! let users = Table::new("users", vec![Column::shared("id"), Column::shared("name")]);
//! conn.create(&users)?;
//! conn.insert(&users, &Row::new().with("id", "1").with("name", "Alice"))?;
//! let result = conn.select(&users, &Filter::all())?;
//! assert_eq!(result.rows()[0].get_str("name")?, "Alice");
//! ```

// Allow casts in FFI code where we need to match C types exactly
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::borrow_as_ptr)] // FFI requires raw pointers

use crate::escape::SqliteEscaper;
use crate::ffi;
use crate::transaction::{COMMIT_SQL, Strength, Transaction, TransactionState};
use quillite_core::{
    ColumnName, ConfigError, ConnectionError, ConnectionErrorKind, Error, InvariantKind,
    InvariantViolation, QueryResult, Result, Row, Table,
};
use quillite_query::{CommandBuilder, Filter};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::ptr;
use std::rc::{Rc, Weak};

/// Busy timeout applied when none is configured.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 1000;

/// Configuration for opening SQLite connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Path to the database file, or ":memory:" for in-memory database.
    pub path: String,
    /// Open flags (read-only, read-write, create, etc.)
    pub flags: OpenFlags,
    /// How long the engine waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u32,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenFlags {
    /// Open for reading only.
    pub read_only: bool,
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
}

impl OpenFlags {
    /// Create flags for read-only access.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Create flags for read-write access (database must exist).
    pub fn read_write() -> Self {
        Self {
            read_write: true,
            ..Default::default()
        }
    }

    /// Create flags for read-write access with creation if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    /// The `SQLITE_OPEN_*` bit set for `sqlite3_open_v2`.
    pub fn to_sqlite_flags(self) -> c_int {
        let mut flags = 0;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl SqliteConfig {
    /// Create a new config for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create a new config for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Set open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set busy timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

/// A connection to a SQLite database.
///
/// The connection is single-threaded: it is neither `Send` nor `Sync`, and
/// the [`Transaction`] handles it issues borrow it. Keep one connection per
/// database file per process.
pub struct SqliteConnection {
    db: *mut ffi::sqlite3,
    path: String,
    builder: CommandBuilder<SqliteEscaper>,
    current: RefCell<Weak<TransactionState>>,
    commits: Cell<u64>,
}

impl SqliteConnection {
    /// Open a new SQLite connection with the given configuration.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Config(ConfigError {
                message: format!("invalid database path {:?}: contains a NUL byte", config.path),
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let msg = if db.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: db is a failed-open handle that must still be closed
                unsafe {
                    let msg = ffi::errmsg(db);
                    ffi::sqlite3_close_v2(db);
                    msg
                }
            };

            tracing::error!(path = %config.path, code = rc, error = %msg, "failed to open database");
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Open,
                message: format!("failed to open database '{}': {}", config.path, msg),
                code: Some(rc),
            }));
        }

        let timeout = c_int::try_from(config.busy_timeout_ms).unwrap_or(c_int::MAX);
        // SAFETY: db is valid
        let rc = unsafe { ffi::sqlite3_busy_timeout(db, timeout) };
        if rc != ffi::SQLITE_OK {
            // SAFETY: db is valid and not used after this
            let msg = unsafe {
                let msg = ffi::errmsg(db);
                ffi::sqlite3_close_v2(db);
                msg
            };
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Configure,
                message: format!("failed to set busy timeout: {msg}"),
                code: Some(rc),
            }));
        }

        tracing::debug!(
            path = %config.path,
            busy_timeout_ms = config.busy_timeout_ms,
            "opened database"
        );

        Ok(Self {
            db,
            path: config.path.clone(),
            builder: CommandBuilder::new(SqliteEscaper),
            current: RefCell::new(Weak::new()),
            commits: Cell::new(0),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open a file-based database.
    pub fn open_file(path: impl Into<String>) -> Result<Self> {
        Self::open(&SqliteConfig::file(path))
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The builder this connection renders commands with.
    pub fn builder(&self) -> &CommandBuilder<SqliteEscaper> {
        &self.builder
    }

    /// Run one or more SQL statements and collect every reported record.
    ///
    /// NULL values are left out of the rows. A constraint violation comes
    /// back as a finalized result; any other failure is an
    /// [`InvariantKind::EngineFailure`].
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        tracing::debug!(sql, "executing command");

        let c_sql = CString::new(sql).map_err(|_| {
            Error::Invariant(
                InvariantViolation::new(InvariantKind::MalformedFilter, "command contains a NUL byte")
                    .with_sql(sql),
            )
        })?;

        let mut result = QueryResult::new();
        let mut errmsg: *mut c_char = ptr::null_mut();

        // SAFETY: all pointers are valid for the duration of the call; the
        // callback only touches `result` through the pointer passed here.
        let rc = unsafe {
            ffi::sqlite3_exec(
                self.db,
                c_sql.as_ptr(),
                Some(collect_row),
                ptr::from_mut(&mut result).cast::<c_void>(),
                &mut errmsg,
            )
        };

        let message = if errmsg.is_null() {
            String::new()
        } else {
            // SAFETY: errmsg was allocated by sqlite3_exec and is freed right after copying
            unsafe {
                let msg = CStr::from_ptr(errmsg).to_string_lossy().into_owned();
                ffi::sqlite3_free(errmsg.cast());
                msg
            }
        };

        match result.finalize(rc, message) {
            Ok(()) => {
                if result.is_constraint_violation() {
                    tracing::debug!(sql, code = rc, "constraint violation");
                }
                Ok(result)
            }
            Err(Error::Invariant(violation)) => {
                tracing::error!(sql, code = rc, error = %violation.message, "command failed");
                Err(Error::Invariant(violation.with_sql(sql)))
            }
            Err(other) => Err(other),
        }
    }

    /// SELECT every column of `table` where `filter` matches.
    pub fn select(&self, table: &Table, filter: &Filter) -> Result<QueryResult> {
        let sql = self.builder.select(table, filter)?;
        self.execute(&sql)
    }

    /// SELECT a subset of columns where `filter` matches.
    pub fn select_columns<C: ColumnName>(
        &self,
        table: &Table,
        columns: &[C],
        filter: &Filter,
    ) -> Result<QueryResult> {
        let sql = self.builder.select_columns(table, columns, filter)?;
        self.execute(&sql)
    }

    /// COUNT the non-NULL values of every column. The single returned row
    /// maps `COUNT(<column>)` to the count.
    pub fn count(&self, table: &Table, filter: &Filter) -> Result<QueryResult> {
        let sql = self.builder.count(table, filter)?;
        self.execute(&sql)
    }

    /// COUNT the non-NULL values of a subset of columns.
    pub fn count_columns<C: ColumnName>(
        &self,
        table: &Table,
        columns: &[C],
        filter: &Filter,
    ) -> Result<QueryResult> {
        let sql = self.builder.count_columns(table, columns, filter)?;
        self.execute(&sql)
    }

    pub fn insert(&self, table: &Table, row: &Row) -> Result<QueryResult> {
        let sql = self.builder.insert(table, row)?;
        self.execute(&sql)
    }

    /// UPDATE the row's columns wherever `filter` matches.
    pub fn replace(&self, table: &Table, row: &Row, filter: &Filter) -> Result<QueryResult> {
        let sql = self.builder.replace(table, row, filter)?;
        self.execute(&sql)
    }

    /// DELETE wherever `filter` matches.
    pub fn remove(&self, table: &Table, filter: &Filter) -> Result<QueryResult> {
        let sql = self.builder.delete(table, filter)?;
        self.execute(&sql)
    }

    /// Set `columns` to NULL wherever `filter` matches.
    pub fn clear<C: ColumnName>(
        &self,
        table: &Table,
        columns: &[C],
        filter: &Filter,
    ) -> Result<QueryResult> {
        let sql = self.builder.clear(table, columns, filter)?;
        self.execute(&sql)
    }

    /// CREATE TABLE IF NOT EXISTS.
    pub fn create(&self, table: &Table) -> Result<QueryResult> {
        let sql = self.builder.create(table);
        self.execute(&sql)
    }

    pub fn exclusive_transaction(&self) -> Result<Transaction<'_>> {
        self.transaction(Strength::Exclusive)
    }

    pub fn immediate_transaction(&self) -> Result<Transaction<'_>> {
        self.transaction(Strength::Immediate)
    }

    pub fn deferred_transaction(&self) -> Result<Transaction<'_>> {
        self.transaction(Strength::Deferred)
    }

    /// Begin a transaction, or join the one already open.
    ///
    /// An open transaction of the same or a stronger strength is shared.
    /// Asking for more than the open transaction provides is a
    /// [`InvariantKind::TransactionConflict`].
    pub fn transaction(&self, strength: Strength) -> Result<Transaction<'_>> {
        let active = self.current.borrow().upgrade();
        if let Some(state) = active {
            let open = state.strength();
            if !open.satisfies(strength) {
                tracing::error!(requested = %strength, open = %open, "transaction conflict");
                return Err(Error::invariant(
                    InvariantKind::TransactionConflict,
                    format!("requested a {strength} transaction while a {open} transaction is open"),
                ));
            }
            tracing::trace!(requested = %strength, open = %open, "joining open transaction");
            return Ok(Transaction::new(self, state));
        }

        let sql = strength.begin_sql();
        let result = self.execute(sql)?;
        if !result.is_success() {
            return Err(Error::Invariant(
                InvariantViolation::new(
                    InvariantKind::EngineFailure,
                    format!("could not begin transaction: {}", result.return_string()?),
                )
                .with_sql(sql),
            ));
        }

        let state = Rc::new(TransactionState::new(strength));
        *self.current.borrow_mut() = Rc::downgrade(&state);
        tracing::debug!(%strength, "transaction started");
        Ok(Transaction::new(self, state))
    }

    /// Strength of the open transaction, or `None` when idle.
    pub fn transaction_strength(&self) -> Option<Strength> {
        self.current.borrow().upgrade().map(|state| state.strength())
    }

    /// Commit the open transaction. Called when its last handle is released.
    pub(crate) fn commit_transaction(&self, strength: Strength) -> Result<QueryResult> {
        *self.current.borrow_mut() = Weak::new();

        let result = self.execute(COMMIT_SQL)?;
        if !result.is_success() {
            return Err(Error::Invariant(
                InvariantViolation::new(
                    InvariantKind::EngineFailure,
                    format!("could not commit transaction: {}", result.return_string()?),
                )
                .with_sql(COMMIT_SQL),
            ));
        }

        self.commits.set(self.commits.get() + 1);
        tracing::debug!(%strength, "transaction committed");
        Ok(result)
    }

    /// Number of transactions this connection has committed.
    pub fn commit_count(&self) -> u64 {
        self.commits.get()
    }

    /// Is the engine outside any explicit transaction?
    pub fn is_autocommit(&self) -> bool {
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_get_autocommit(self.db) != 0 }
    }

    /// Get the last insert rowid.
    pub fn last_insert_rowid(&self) -> i64 {
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_last_insert_rowid(self.db) }
    }

    /// Get the number of rows changed by the last statement.
    pub fn changes(&self) -> i32 {
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_changes(self.db) }
    }
}

/// `sqlite3_exec` callback: append one record to the [`QueryResult`] behind `data`.
unsafe extern "C" fn collect_row(
    data: *mut c_void,
    count: c_int,
    values: *mut *mut c_char,
    names: *mut *mut c_char,
) -> c_int {
    // SAFETY: data is the &mut QueryResult passed to sqlite3_exec
    let result = unsafe { &mut *data.cast::<QueryResult>() };
    let mut row = Row::new();

    for i in 0..usize::try_from(count).unwrap_or(0) {
        // SAFETY: the engine passes `count` name and value pointers
        let (name, value) = unsafe { (*names.add(i), *values.add(i)) };
        if value.is_null() || name.is_null() {
            continue;
        }
        // SAFETY: non-null entries are NUL-terminated strings valid for this call
        let (name, value) = unsafe { (CStr::from_ptr(name), CStr::from_ptr(value)) };
        row.set(engine_text(name), engine_text(value));
    }

    // A non-zero return aborts the command with SQLITE_ABORT
    c_int::from(result.add_row(row).is_err())
}

/// Copy engine text, replacing invalid UTF-8 with U+FFFD.
fn engine_text(text: &CStr) -> String {
    match text.to_string_lossy() {
        Cow::Borrowed(s) => s.to_owned(),
        Cow::Owned(s) => {
            tracing::warn!(value = %s, "engine returned invalid UTF-8; replaced with U+FFFD");
            s
        }
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if !self.db.is_null() {
            // SAFETY: db is valid and no transaction handle can outlive the connection
            unsafe {
                ffi::sqlite3_close_v2(self.db);
            }
        }
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .field("transaction", &self.transaction_strength())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quillite_core::{Column, ResultCode};
    use quillite_query::filter;
    use std::sync::Arc;

    fn users() -> Table {
        Table::new(
            "users",
            vec![
                Arc::new(Column::with_declaration("id", "INTEGER PRIMARY KEY")),
                Arc::new(Column::with_declaration("name", "TEXT")),
                Arc::new(Column::with_declaration("email", "TEXT UNIQUE")),
            ],
        )
    }

    fn setup() -> (SqliteConnection, Table) {
        let conn = SqliteConnection::open_memory().unwrap();
        let table = users();
        assert!(conn.create(&table).unwrap().is_success());
        (conn, table)
    }

    fn user(id: i64, name: &str, email: &str) -> Row {
        Row::new()
            .with("id", id.to_string())
            .with("name", name)
            .with("email", email)
    }

    #[test]
    fn test_open_memory() {
        let conn = SqliteConnection::open_memory().unwrap();
        assert_eq!(conn.path(), ":memory:");
        assert!(conn.is_autocommit());
        assert_eq!(conn.transaction_strength(), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = SqliteConfig::default();
        assert_eq!(config.path, ":memory:");
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(config.flags, OpenFlags::create_read_write());

        let config = SqliteConfig::file("app.db").busy_timeout(250);
        assert_eq!(config.path, "app.db");
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_config_from_json() {
        let config: SqliteConfig =
            serde_json::from_str(r#"{"path": "data.db", "flags": {"read_only": true}}"#).unwrap();
        assert_eq!(config.path, "data.db");
        assert_eq!(config.flags, OpenFlags::read_only());
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_open_flags_bits() {
        assert_eq!(
            OpenFlags::read_only().to_sqlite_flags(),
            ffi::SQLITE_OPEN_READONLY
        );
        assert_eq!(
            OpenFlags::read_write().to_sqlite_flags(),
            ffi::SQLITE_OPEN_READWRITE
        );
        assert_eq!(
            OpenFlags::create_read_write().to_sqlite_flags(),
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE
        );
        // No mode at all falls back to create + read-write
        assert_eq!(
            OpenFlags::default().to_sqlite_flags(),
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute("CREATE TABLE t (v TEXT);").unwrap();
        conn.execute("INSERT INTO t VALUES (CAST(X'FF61' AS TEXT));")
            .unwrap();

        let result = conn.execute("SELECT v FROM t;").unwrap();
        assert_eq!(result.rows()[0].get_str("v").unwrap(), "\u{FFFD}a");
    }

    #[test]
    fn test_nul_in_path_is_config_error() {
        let err = SqliteConnection::open_file("bad\0path").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_open_missing_file_read_write() {
        let path = std::env::temp_dir().join("quillite_missing_dir/none/db.sqlite");
        let config = SqliteConfig::file(path.to_string_lossy().to_string())
            .flags(OpenFlags::read_write());
        let err = SqliteConnection::open(&config).unwrap_err();
        match err {
            Error::Connection(e) => {
                assert_eq!(e.kind, ConnectionErrorKind::Open);
                assert!(e.code.is_some());
            }
            other => panic!("expected connection error, got {other:?}"),
        }
    }

    #[test]
    fn test_execute_raw() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        let result = conn
            .execute("INSERT INTO test (name) VALUES ('Alice')")
            .unwrap();
        assert_eq!(result.return_value().unwrap(), ResultCode::Success);
        assert_eq!(result.return_string().unwrap(), "");
        assert!(result.is_empty());
        assert_eq!(conn.changes(), 1);
        assert_eq!(conn.last_insert_rowid(), 1);
    }

    #[test]
    fn test_insert_then_select() {
        let (conn, table) = setup();
        let row = user(1, "Alice", "alice@example.com");
        assert!(conn.insert(&table, &row).unwrap().is_success());

        let result = conn.select(&table, &Filter::all()).unwrap();
        assert!(result.is_success());
        assert_eq!(result.rows(), &[row]);
    }

    #[test]
    fn test_nulls_are_skipped() {
        let (conn, table) = setup();
        conn.insert(&table, &Row::new().with("id", "1").with("name", "Bob"))
            .unwrap();

        let result = conn.select(&table, &Filter::all()).unwrap();
        let row = result.first().unwrap();
        assert_eq!(row.columns(), ["id", "name"]);
        assert!(!row.contains_column("email"));
        assert_eq!(
            row.get_str("email").unwrap_err().invariant_kind(),
            Some(InvariantKind::MissingColumn)
        );
    }

    #[test]
    fn test_select_columns_with_filter() {
        let (conn, table) = setup();
        conn.insert(&table, &user(1, "Alice", "a@x")).unwrap();
        conn.insert(&table, &user(2, "O'Brien", "o@x")).unwrap();

        let result = conn
            .select_columns(&table, &["id"], &filter!("name='%s'", "O'Brien"))
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].get_uint("id").unwrap(), 2);
        assert_eq!(result.rows()[0].len(), 1);
    }

    #[test]
    fn test_count() {
        let (conn, table) = setup();
        conn.insert(&table, &user(1, "Alice", "a@x")).unwrap();
        conn.insert(&table, &Row::new().with("id", "2").with("name", "Bob"))
            .unwrap();

        let result = conn.count(&table, &Filter::all()).unwrap();
        let row = result.first().unwrap();
        assert_eq!(row.get_uint("COUNT(id)").unwrap(), 2);
        assert_eq!(row.get_uint("COUNT(email)").unwrap(), 1);

        let result = conn
            .count_columns(&table, &["name"], &filter!("id>%d", 1))
            .unwrap();
        assert_eq!(result.rows()[0].get_uint("COUNT(name)").unwrap(), 1);
    }

    #[test]
    fn test_replace_remove_clear() {
        let (conn, table) = setup();
        conn.insert(&table, &user(1, "Alice", "a@x")).unwrap();
        conn.insert(&table, &user(2, "Bob", "b@x")).unwrap();

        conn.replace(&table, &Row::new().with("name", "Alicia"), &filter!("id=%d", 1))
            .unwrap();
        conn.clear(&table, &["email"], &filter!("id=%d", 2)).unwrap();
        conn.remove(&table, &filter!("name='%s'", "nobody")).unwrap();
        assert_eq!(conn.changes(), 0);

        let rows = conn.select(&table, &Filter::all()).unwrap().into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("Alicia"));
        assert_eq!(rows[1].get("email"), None);

        conn.remove(&table, &filter!("id=%d", 1)).unwrap();
        assert_eq!(conn.select(&table, &Filter::all()).unwrap().len(), 1);
    }

    #[test]
    fn test_constraint_violation_is_an_outcome() {
        let (conn, table) = setup();
        conn.insert(&table, &user(1, "Alice", "a@x")).unwrap();

        let result = conn.insert(&table, &user(1, "Again", "b@x")).unwrap();
        assert!(result.is_constraint_violation());
        assert_eq!(
            result.return_value().unwrap(),
            ResultCode::ConstraintViolation
        );
        assert!(!result.return_string().unwrap().is_empty());

        let result = conn.insert(&table, &user(2, "Dup", "a@x")).unwrap();
        assert!(result.is_constraint_violation());
    }

    #[test]
    fn test_engine_failure_carries_context() {
        let conn = SqliteConnection::open_memory().unwrap();
        let missing = Table::new("missing", vec![Column::shared("a")]);
        let err = conn.select(&missing, &Filter::all()).unwrap_err();

        assert_eq!(err.invariant_kind(), Some(InvariantKind::EngineFailure));
        assert_eq!(err.code(), Some(ffi::SQLITE_ERROR));
        assert_eq!(
            err.sql(),
            Some("SELECT a FROM missing WHERE 'true'='true';")
        );
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_hostile_values_stored_verbatim() {
        let (conn, table) = setup();
        let hostile = "x'); DROP TABLE users; --";
        conn.insert(&table, &user(1, hostile, "h@x")).unwrap();

        let result = conn
            .select(&table, &filter!("name='%s'", hostile))
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].get_str("name").unwrap(), hostile);
    }

    #[test]
    fn test_transaction_lifecycle() {
        let (conn, table) = setup();
        {
            let tx = conn.immediate_transaction().unwrap();
            assert_eq!(tx.strength(), Strength::Immediate);
            assert_eq!(conn.transaction_strength(), Some(Strength::Immediate));
            assert!(!conn.is_autocommit());
            conn.insert(&table, &user(1, "Alice", "a@x")).unwrap();
        }
        assert_eq!(conn.transaction_strength(), None);
        assert!(conn.is_autocommit());
        assert_eq!(conn.commit_count(), 1);
        assert_eq!(conn.select(&table, &Filter::all()).unwrap().len(), 1);
    }

    #[test]
    fn test_same_strength_shares_transaction() {
        let conn = SqliteConnection::open_memory().unwrap();
        let a = conn.deferred_transaction().unwrap();
        let b = conn.deferred_transaction().unwrap();
        assert!(a.same_transaction(&b));
        assert_eq!(a.owners(), 2);

        drop(a);
        assert_eq!(conn.commit_count(), 0);
        assert_eq!(conn.transaction_strength(), Some(Strength::Deferred));

        drop(b);
        assert_eq!(conn.commit_count(), 1);
        assert_eq!(conn.transaction_strength(), None);
    }

    #[test]
    fn test_weaker_request_joins_stronger_transaction() {
        let conn = SqliteConnection::open_memory().unwrap();
        let exclusive = conn.exclusive_transaction().unwrap();
        let deferred = conn.deferred_transaction().unwrap();
        assert!(exclusive.same_transaction(&deferred));
        assert_eq!(deferred.strength(), Strength::Exclusive);
    }

    #[test]
    fn test_stronger_request_conflicts() {
        let conn = SqliteConnection::open_memory().unwrap();
        let _deferred = conn.deferred_transaction().unwrap();
        let err = conn.immediate_transaction().unwrap_err();
        assert_eq!(err.invariant_kind(), Some(InvariantKind::TransactionConflict));
        assert_eq!(conn.transaction_strength(), Some(Strength::Deferred));
    }

    #[test]
    fn test_explicit_commit() {
        let conn = SqliteConnection::open_memory().unwrap();
        let tx = conn.exclusive_transaction().unwrap();
        let shared = tx.clone();

        assert!(shared.commit().unwrap().is_none());
        let result = tx.commit().unwrap().unwrap();
        assert!(result.is_success());
        assert_eq!(conn.commit_count(), 1);

        let next = conn.deferred_transaction().unwrap();
        assert_eq!(next.strength(), Strength::Deferred);
    }
}
