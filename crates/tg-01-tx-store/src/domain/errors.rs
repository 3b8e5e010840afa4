//! # Store Errors

use thiserror::Error;

/// Errors reported by a `TransactionStore`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend failure (connection loss, lock timeout). Safe to retry.
    #[error("Database error: {0}")]
    Database(String),

    /// A referenced row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique-constraint rejection. Callers treat it as success.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Stored data breaks an invariant.
    #[error("Corrupt data: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}
