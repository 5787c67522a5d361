//! Caller-owned transactions.
//!
//! `ConnectionManager::begin_transaction` moves one pooled connection out of
//! implicit per-call pooling and into a [`TransactionHandle`]. Every statement
//! issued through the handle runs on that single connection until the handle
//! is released by a commit or a rollback.

use crate::db::executor;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryResult, Value};
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Sqlite, Transaction};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Database-specific transaction wrapper.
///
/// This enum wraps database-specific transaction types to provide
/// a unified interface for transaction management.
pub enum DbTransaction {
    /// PostgreSQL transaction
    Postgres(Transaction<'static, Postgres>),
    /// SQLite transaction
    SQLite(Transaction<'static, Sqlite>),
}

impl DbTransaction {
    /// Get the database type for this transaction.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbTransaction::Postgres(_) => DatabaseType::PostgreSQL,
            DbTransaction::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Run a statement on the transaction's connection.
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> DbResult<QueryResult> {
        match self {
            DbTransaction::Postgres(tx) => executor::postgres::execute(&mut **tx, sql, params).await,
            DbTransaction::SQLite(tx) => executor::sqlite::execute(&mut **tx, sql, params).await,
        }
    }

    /// Commit the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self {
            DbTransaction::Postgres(tx) => tx.commit().await.map_err(DbError::from),
            DbTransaction::SQLite(tx) => tx.commit().await.map_err(DbError::from),
        }
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> DbResult<()> {
        match self {
            DbTransaction::Postgres(tx) => tx.rollback().await.map_err(DbError::from),
            DbTransaction::SQLite(tx) => tx.rollback().await.map_err(DbError::from),
        }
    }
}

/// Lifecycle of a [`TransactionHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Committed => write!(f, "committed"),
            Self::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// A dedicated connection in an open transaction, owned by the caller.
///
/// The handle must be released exactly once, through
/// `ConnectionManager::commit_transaction` or
/// `ConnectionManager::rollback_transaction`. Releasing it a second time is
/// rejected. A failing statement does not release the handle: the caller
/// still has to roll back.
///
/// Dropping a handle that is still active rolls the transaction back in the
/// background and logs a warning.
pub struct TransactionHandle {
    id: String,
    started_at: DateTime<Utc>,
    state: TransactionState,
    transaction: Option<DbTransaction>,
    open_transactions: Arc<AtomicUsize>,
}

impl std::fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TransactionHandle {
    pub(crate) fn new(transaction: DbTransaction, open_transactions: Arc<AtomicUsize>) -> Self {
        open_transactions.fetch_add(1, Ordering::SeqCst);
        Self {
            id: generate_transaction_id(),
            started_at: Utc::now(),
            state: TransactionState::Active,
            transaction: Some(transaction),
            open_transactions,
        }
    }

    /// Unique transaction identifier (`tx_` + 32 hex chars).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When `BEGIN` was issued.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    pub(crate) async fn execute(&mut self, sql: &str, params: &[Value]) -> DbResult<QueryResult> {
        let state = self.state;
        let tx = self.transaction.as_mut().ok_or_else(|| {
            DbError::transaction(format!("Transaction is already {}", state), &self.id)
        })?;

        let result = tx.execute(sql, params).await;
        if let Err(e) = &result {
            // The transaction stays open; rolling back is the caller's call
            debug!(
                transaction_id = %self.id,
                error = %e,
                "Statement failed inside transaction"
            );
        }
        result
    }

    pub(crate) async fn commit(&mut self) -> DbResult<()> {
        let tx = self.release(TransactionState::Committed)?;
        tx.commit().await?;
        info!(transaction_id = %self.id, "Transaction committed");
        Ok(())
    }

    pub(crate) async fn rollback(&mut self) -> DbResult<()> {
        let tx = self.release(TransactionState::RolledBack)?;
        tx.rollback().await?;
        info!(transaction_id = %self.id, "Transaction rolled back");
        Ok(())
    }

    /// Take the transaction out of the handle, moving it to its final state.
    ///
    /// The handle counts as released from here on even if COMMIT/ROLLBACK
    /// then fails: the underlying connection goes back to the pool either way.
    fn release(&mut self, next: TransactionState) -> DbResult<DbTransaction> {
        let Some(tx) = self.transaction.take() else {
            return Err(DbError::transaction(
                format!("Transaction is already {}", self.state),
                &self.id,
            ));
        };
        self.state = next;
        self.open_transactions.fetch_sub(1, Ordering::SeqCst);
        Ok(tx)
    }
}

impl Drop for TransactionHandle {
    fn drop(&mut self) {
        if self.transaction.take().is_some() {
            self.open_transactions.fetch_sub(1, Ordering::SeqCst);
            warn!(
                transaction_id = %self.id,
                "Transaction handle dropped while active; rolling back"
            );
        }
    }
}

/// Generate a unique transaction ID.
fn generate_transaction_id() -> String {
    format!("tx_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_format() {
        let id = generate_transaction_id();
        assert!(id.starts_with("tx_"));
        assert_eq!(id.len(), 3 + 32); // "tx_" + 32 hex chars
    }

    #[test]
    fn test_transaction_state_display() {
        assert_eq!(TransactionState::Active.to_string(), "active");
        assert_eq!(TransactionState::Committed.to_string(), "committed");
        assert_eq!(TransactionState::RolledBack.to_string(), "rolled back");
    }
}
