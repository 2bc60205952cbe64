//! Scoped transactions.
//!
//! A connection has at most one transaction open. Requesting one while none is
//! active issues `BEGIN <strength> TRANSACTION;` and hands back a
//! reference-counted [`Transaction`]. Further requests of the same or a weaker
//! strength share that transaction; a request for a stronger one is a
//! [`TransactionConflict`](quillite_core::InvariantKind::TransactionConflict).
//! When the last handle goes away the transaction commits with
//! `END TRANSACTION;`.
//!
//! The connection only observes the transaction through a `Weak`, and a handle
//! only borrows its connection, so neither keeps the other alive.

use crate::connection::SqliteConnection;
use quillite_core::{QueryResult, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Locking strength of a transaction, ordered weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Strength {
    /// Locks are taken lazily on first read/write
    Deferred,
    /// A write lock is taken immediately
    Immediate,
    /// Readers and writers are both locked out
    Exclusive,
}

impl Strength {
    /// The SQL keyword for this strength.
    pub const fn keyword(self) -> &'static str {
        match self {
            Strength::Deferred => "DEFERRED",
            Strength::Immediate => "IMMEDIATE",
            Strength::Exclusive => "EXCLUSIVE",
        }
    }

    /// The command that opens a transaction of this strength.
    pub const fn begin_sql(self) -> &'static str {
        match self {
            Strength::Deferred => "BEGIN DEFERRED TRANSACTION;",
            Strength::Immediate => "BEGIN IMMEDIATE TRANSACTION;",
            Strength::Exclusive => "BEGIN EXCLUSIVE TRANSACTION;",
        }
    }

    /// Can a transaction of this strength serve a request for `requested`?
    pub fn satisfies(self, requested: Strength) -> bool {
        self >= requested
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keyword().to_ascii_lowercase())
    }
}

/// The command that commits the open transaction.
pub const COMMIT_SQL: &str = "END TRANSACTION;";

/// Shared state of one open transaction.
#[derive(Debug)]
pub(crate) struct TransactionState {
    strength: Strength,
}

impl TransactionState {
    pub(crate) fn new(strength: Strength) -> Self {
        Self { strength }
    }

    pub(crate) fn strength(&self) -> Strength {
        self.strength
    }
}

/// A handle to the connection's open transaction.
///
/// Cloning a handle, or requesting a same-or-weaker transaction from the
/// connection, adds an owner. The transaction commits when the last owner is
/// dropped or calls [`Transaction::commit`].
///
/// A commit that fails while a handle is being dropped cannot be reported
/// to anyone, so it panics. Use [`Transaction::commit`] on the last handle to
/// get the failure as an `Err` instead.
#[derive(Clone)]
pub struct Transaction<'conn> {
    conn: &'conn SqliteConnection,
    state: Option<Rc<TransactionState>>,
}

impl<'conn> Transaction<'conn> {
    pub(crate) fn new(conn: &'conn SqliteConnection, state: Rc<TransactionState>) -> Self {
        Self {
            conn,
            state: Some(state),
        }
    }

    /// The strength of the open transaction. This can be stronger than
    /// the strength that was requested.
    pub fn strength(&self) -> Strength {
        self.state
            .as_ref()
            .map_or(Strength::Deferred, |state| state.strength())
    }

    /// The connection this transaction runs on.
    pub fn connection(&self) -> &'conn SqliteConnection {
        self.conn
    }

    /// Number of handles sharing this transaction.
    pub fn owners(&self) -> usize {
        self.state.as_ref().map_or(0, Rc::strong_count)
    }

    /// Do both handles refer to the same open transaction?
    pub fn same_transaction(&self, other: &Transaction<'_>) -> bool {
        match (&self.state, &other.state) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Release this handle now.
    ///
    /// If it was the last owner the transaction commits and the commit
    /// result is returned; otherwise the transaction stays open and `None`
    /// is returned.
    pub fn commit(mut self) -> Result<Option<QueryResult>> {
        let Some(state) = self.state.take() else {
            return Ok(None);
        };
        if Rc::strong_count(&state) > 1 {
            return Ok(None);
        }
        self.conn.commit_transaction(state.strength()).map(Some)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        if Rc::strong_count(&state) > 1 {
            return;
        }

        if let Err(err) = self.conn.commit_transaction(state.strength()) {
            tracing::error!(error = %err, "error closing transaction");
            if !std::thread::panicking() {
                panic!("error closing transaction: {err}");
            }
        }
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("strength", &self.strength())
            .field("owners", &self.owners())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strengths_are_totally_ordered() {
        assert!(Strength::Deferred < Strength::Immediate);
        assert!(Strength::Immediate < Strength::Exclusive);
        assert!(Strength::Exclusive.satisfies(Strength::Deferred));
        assert!(Strength::Immediate.satisfies(Strength::Immediate));
        assert!(!Strength::Deferred.satisfies(Strength::Immediate));
    }

    #[test]
    fn begin_commands() {
        assert_eq!(Strength::Deferred.begin_sql(), "BEGIN DEFERRED TRANSACTION;");
        assert_eq!(
            Strength::Immediate.begin_sql(),
            "BEGIN IMMEDIATE TRANSACTION;"
        );
        assert_eq!(
            Strength::Exclusive.begin_sql(),
            "BEGIN EXCLUSIVE TRANSACTION;"
        );
        assert_eq!(Strength::Exclusive.to_string(), "exclusive");
    }
}
