//! # Filter Errors
//!
//! Validation failures for request parameters and schema/model mismatches
//! found while compiling predicates.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for predicate compilation
pub type FilterResult<T> = Result<T, FilterError>;

/// Schema/model mismatches. These are wiring bugs, not user errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A filter targets an attribute the model does not have
    #[error("Model {model} has no attribute {attribute}")]
    UnknownAttribute { model: String, attribute: String },

    /// A key combines operator and cardinality in an unsupported way
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),
}

/// One rejected request parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Parameter as spelled on the wire
    pub param: String,
    pub message: String,
}

/// Every rejected parameter of one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, param: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            param: param.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Single-error convenience
    pub fn single(param: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(param, message);
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid parameters: ")?;
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.param, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
