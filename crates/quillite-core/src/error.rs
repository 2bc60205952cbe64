//! Error types for Quillite operations.
//!
//! Two classes of failure exist. A constraint violation reported by the
//! engine is a normal outcome and travels inside
//! [`QueryResult`](crate::QueryResult). Everything else that goes wrong is
//! either a connection/configuration problem or an [`InvariantViolation`]:
//! a bug in the calling code or a broken environment that must not be
//! silently swallowed. Hosts that want the historical fail-fast behaviour
//! can escalate through [`FailFast::or_abort`].

use std::fmt;

/// The primary error type for all Quillite operations.
#[derive(Debug)]
pub enum Error {
    /// Opening or closing the engine handle failed
    Connection(ConnectionError),
    /// A programmer or environment error; see [`InvariantKind`]
    Invariant(InvariantViolation),
    /// A row value could not be parsed as the requested type
    Type(TypeError),
    /// Invalid configuration (bad path, bad flags)
    Config(ConfigError),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    /// Engine result code, when the engine produced one
    pub code: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the database
    Open,
    /// Failed to configure the freshly opened handle
    Configure,
}

/// A violated invariant: the fail-fast class of errors.
#[derive(Debug)]
pub struct InvariantViolation {
    pub kind: InvariantKind,
    pub message: String,
    /// The command being executed when the violation surfaced
    pub sql: Option<String>,
    /// Engine result code, for [`InvariantKind::EngineFailure`]
    pub code: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    /// The engine returned a code other than success or constraint violation
    EngineFailure,
    /// A result's outcome was read before it was finalized
    ResultNotFinalized,
    /// A result was finalized twice
    ResultAlreadyFinalized,
    /// A row was added to a result after finalization
    RowAfterFinalize,
    /// A transaction of a stronger kind was requested while one is open
    TransactionConflict,
    /// A row was asked for a column it does not hold
    MissingColumn,
    /// A filter template and its arguments do not agree
    MalformedFilter,
    /// An identifier failed validation
    InvalidIdentifier,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl InvariantViolation {
    /// Create a violation with no command or engine code attached.
    pub fn new(kind: InvariantKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sql: None,
            code: None,
        }
    }

    /// Attach the command that was running.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Attach the engine result code.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }
}

impl InvariantKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvariantKind::EngineFailure => "engine failure",
            InvariantKind::ResultNotFinalized => "result not finalized",
            InvariantKind::ResultAlreadyFinalized => "result already finalized",
            InvariantKind::RowAfterFinalize => "row added after finalize",
            InvariantKind::TransactionConflict => "transaction conflict",
            InvariantKind::MissingColumn => "missing column",
            InvariantKind::MalformedFilter => "malformed filter",
            InvariantKind::InvalidIdentifier => "invalid identifier",
        }
    }
}

impl Error {
    /// Shorthand for building an [`Error::Invariant`].
    pub fn invariant(kind: InvariantKind, message: impl Into<String>) -> Self {
        Error::Invariant(InvariantViolation::new(kind, message))
    }

    /// Is this one of the fail-fast errors?
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }

    /// The invariant that was violated, if this is an invariant violation.
    pub fn invariant_kind(&self) -> Option<InvariantKind> {
        match self {
            Error::Invariant(v) => Some(v.kind),
            _ => None,
        }
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Invariant(v) => v.sql.as_deref(),
            _ => None,
        }
    }

    /// Get the engine result code, if available
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Invariant(v) => v.code,
            Error::Connection(c) => c.code,
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e),
            Error::Invariant(e) => write!(f, "Invariant violation ({}): {}", e.kind.as_str(), e),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => Some(e),
            Error::Invariant(e) => Some(e),
            Error::Type(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = self.code {
            write!(f, " (code {})", code)?;
        }
        if let Some(sql) = &self.sql {
            write!(f, " in '{}'", sql)?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found '{}'",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found '{}'", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConnectionError {}
impl std::error::Error for InvariantViolation {}
impl std::error::Error for TypeError {}
impl std::error::Error for ConfigError {}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<InvariantViolation> for Error {
    fn from(err: InvariantViolation) -> Self {
        Error::Invariant(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for Quillite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Escalate errors to a panic at an embedding boundary.
///
/// The library itself never aborts; a host that wants every non-constraint
/// failure to stop the program calls `or_abort()` on the results it gets back.
pub trait FailFast<T> {
    /// Return the value, or log the error and panic with its diagnostic.
    fn or_abort(self) -> T;
}

impl<T> FailFast<T> for Result<T> {
    #[track_caller]
    fn or_abort(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(error = %err, "aborting on unrecoverable error");
                panic!("{err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_helpers() {
        let err: Error = InvariantViolation::new(InvariantKind::EngineFailure, "no such table: t")
            .with_sql("SELECT a FROM t WHERE 'true'='true';")
            .with_code(1)
            .into();

        assert!(err.is_invariant_violation());
        assert_eq!(err.invariant_kind(), Some(InvariantKind::EngineFailure));
        assert_eq!(err.sql(), Some("SELECT a FROM t WHERE 'true'='true';"));
        assert_eq!(err.code(), Some(1));
    }

    #[test]
    fn display_includes_kind_code_and_sql() {
        let err = Error::Invariant(
            InvariantViolation::new(InvariantKind::EngineFailure, "syntax error")
                .with_sql("SELEC 1;")
                .with_code(1),
        );
        assert_eq!(
            err.to_string(),
            "Invariant violation (engine failure): syntax error (code 1) in 'SELEC 1;'"
        );
    }

    #[test]
    fn non_invariant_errors_are_not_fail_fast() {
        let err = Error::Type(TypeError {
            expected: "u64",
            actual: "-3".to_string(),
            column: Some("id".to_string()),
        });
        assert!(!err.is_invariant_violation());
        assert_eq!(err.invariant_kind(), None);
        assert_eq!(err.to_string(), "Type error: expected u64 for column 'id', found '-3'");
    }

    #[test]
    fn or_abort_passes_values_through() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(ok.or_abort(), 7);
    }

    #[test]
    #[should_panic(expected = "transaction conflict")]
    fn or_abort_panics_on_errors() {
        let err: Result<()> = Err(Error::invariant(
            InvariantKind::TransactionConflict,
            "deferred transaction already open",
        ));
        err.or_abort();
    }
}
