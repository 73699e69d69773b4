//! # Facade Errors

use thiserror::Error;

use crate::filters::FilterError;
use crate::store::StoreError;

/// Result type for facade operations
pub type DbResult<T> = Result<T, DbError>;

/// Facade errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Primary-key lookup found nothing
    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: String },

    /// Custom filters without a registered search handler
    #[error("Search method {method} is not implemented for {schema}")]
    NotImplemented { method: String, schema: String },

    /// Update data does not conform to the field's declared type
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Access denied by an auth collaborator
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Filter schema and model disagree
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(#[from] FilterError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Stored row does not decode into the requested model type
    #[error("Cannot decode row: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DbError {
    pub(crate) fn not_found(kind: &str, id: &serde_json::Value) -> Self {
        let id = match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        DbError::NotFound {
            kind: kind.to_string(),
            id,
        }
    }
}
