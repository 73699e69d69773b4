//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a store session
#[derive(Debug, Error)]
pub enum StoreError {
    /// Shared table lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// A row without a primary key whose type cannot be generated
    #[error("Cannot assign a primary key to a row of {table}")]
    MissingPrimaryKey { table: String },
}
