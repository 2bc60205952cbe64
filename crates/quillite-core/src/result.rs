//! Command results.

use crate::Result;
use crate::error::{Error, InvariantKind, InvariantViolation};
use crate::row::Row;
use serde::Serialize;

/// Engine result code for success.
pub const ENGINE_OK: i32 = 0;
/// Engine primary result code for a constraint violation.
pub const ENGINE_CONSTRAINT: i32 = 19;

/// The outcome of a command that reached the engine.
///
/// Only these two outcomes are normal. Every other engine code is an
/// [`InvariantKind::EngineFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultCode {
    /// The command was applied
    Success,
    /// A UNIQUE, NOT NULL, CHECK, PRIMARY KEY or FOREIGN KEY constraint rejected the command
    ConstraintViolation,
}

impl ResultCode {
    /// Classify an engine result code.
    ///
    /// Extended codes are reduced to their primary code first, so every
    /// `SQLITE_CONSTRAINT_*` variant is a constraint violation.
    pub fn from_engine_code(code: i32) -> Option<Self> {
        match code & 0xff {
            ENGINE_OK => Some(ResultCode::Success),
            ENGINE_CONSTRAINT => Some(ResultCode::ConstraintViolation),
            _ => None,
        }
    }
}

/// The rows and outcome of one command.
///
/// Rows accumulate while the engine runs the command, then the outcome is
/// recorded exactly once with [`QueryResult::finalize`]. Reading the outcome
/// before that, finalizing twice, or adding rows afterwards are invariant
/// violations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    outcome: Option<(ResultCode, String)>,
    rows: Vec<Row>,
}

impl QueryResult {
    /// Create an empty, unfinalized result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record.
    pub fn add_row(&mut self, row: Row) -> Result<()> {
        if self.outcome.is_some() {
            return Err(misuse(
                InvariantKind::RowAfterFinalize,
                "add_row() called after finalize()",
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Record the engine's result code and message.
    ///
    /// Codes other than success and constraint violation are returned as
    /// [`InvariantKind::EngineFailure`] and leave the result unfinalized.
    pub fn finalize(&mut self, code: i32, message: impl Into<String>) -> Result<()> {
        if self.outcome.is_some() {
            return Err(misuse(
                InvariantKind::ResultAlreadyFinalized,
                "finalize() called twice",
            ));
        }

        let message = message.into();
        let Some(outcome) = ResultCode::from_engine_code(code) else {
            tracing::error!(code, message = %message, "unknown engine result code");
            return Err(Error::Invariant(
                InvariantViolation::new(
                    InvariantKind::EngineFailure,
                    format!("unknown engine result code {}: '{}'", code, message),
                )
                .with_code(code),
            ));
        };

        self.outcome = Some((outcome, message));
        Ok(())
    }

    /// Has [`QueryResult::finalize`] been called?
    pub fn is_finalized(&self) -> bool {
        self.outcome.is_some()
    }

    /// The outcome code.
    pub fn return_value(&self) -> Result<ResultCode> {
        self.outcome.as_ref().map(|(code, _)| *code).ok_or_else(|| {
            misuse(
                InvariantKind::ResultNotFinalized,
                "return_value() called before finalize()",
            )
        })
    }

    /// The engine's message; empty on success.
    pub fn return_string(&self) -> Result<&str> {
        self.outcome.as_ref().map(|(_, msg)| msg.as_str()).ok_or_else(|| {
            misuse(
                InvariantKind::ResultNotFinalized,
                "return_string() called before finalize()",
            )
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Some((ResultCode::Success, _)))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self.outcome, Some((ResultCode::ConstraintViolation, _)))
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A JSON view: `{"outcome": .., "message": .., "rows": [..]}`.
    pub fn to_json(&self) -> serde_json::Value {
        let (outcome, message) = match &self.outcome {
            Some((code, msg)) => (
                serde_json::to_value(code).unwrap_or(serde_json::Value::Null),
                serde_json::Value::String(msg.clone()),
            ),
            None => (serde_json::Value::Null, serde_json::Value::Null),
        };
        serde_json::json!({
            "outcome": outcome,
            "message": message,
            "rows": self.rows.iter().map(Row::to_json).collect::<Vec<_>>(),
        })
    }
}

fn misuse(kind: InvariantKind, message: &str) -> Error {
    tracing::error!(kind = kind.as_str(), "{}", message);
    Error::invariant(kind, message)
}
