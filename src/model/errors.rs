//! # Model Errors

use thiserror::Error;

/// Result type for model reflection
pub type ModelResult<T> = Result<T, ModelError>;

/// Malformed model descriptors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Field {field} declared twice in {model}")]
    DuplicateField { model: String, field: String },

    #[error("Field {field} of {model} declares no concrete type")]
    UntypedField { model: String, field: String },

    #[error("Model {0} has no primary key")]
    MissingPrimaryKey(String),

    #[error("Model {0} declares more than one primary key")]
    MultiplePrimaryKeys(String),
}
