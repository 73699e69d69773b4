//! # REST API Errors
//!
//! Error types for the REST API module.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;
use crate::filters::{FieldError, ValidationErrors};

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Query parameters or body values failed validation
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Invalid request body
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// No resource is registered under this name
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Access denied
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Custom filters without a search method
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Internal error during query execution
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RestError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RestError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            RestError::NotFound(_) | RestError::UnknownResource(_) => StatusCode::NOT_FOUND,
            RestError::NotImplemented(_) | RestError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ValidationErrors> for RestError {
    fn from(errors: ValidationErrors) -> Self {
        RestError::Validation(errors)
    }
}

impl From<DbError> for RestError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => RestError::NotFound(err.to_string()),
            DbError::InvalidValue { field, message } => {
                RestError::Validation(ValidationErrors::single(field, message))
            }
            DbError::Unauthorized(reason) => RestError::Unauthorized(reason),
            DbError::NotImplemented { .. } => RestError::NotImplemented(err.to_string()),
            DbError::SchemaMismatch(_) | DbError::Store(_) | DbError::Decode(_) => {
                RestError::Internal(err.to_string())
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl From<RestError> for ErrorResponse {
    fn from(err: RestError) -> Self {
        let code = err.status_code().as_u16();
        match err {
            RestError::Validation(errors) => Self {
                error: "Invalid parameters".to_string(),
                code,
                details: errors.errors,
            },
            other => Self {
                error: other.to_string(),
                code,
                details: Vec::new(),
            },
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RestError::Validation(ValidationErrors::single("age", "expected int")).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            RestError::InvalidBody("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RestError::NotFound("users 1 not found".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RestError::Unauthorized("test".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RestError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_db_error_mapping() {
        let err = RestError::from(DbError::NotFound {
            kind: "users".to_string(),
            id: "1".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = RestError::from(DbError::InvalidValue {
            field: "age".to_string(),
            message: "expected int".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = RestError::from(DbError::SchemaMismatch(FilterError::UnsupportedFilter(
            "age__gt__in".to_string(),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_body_has_details() {
        let mut errors = ValidationErrors::default();
        errors.push("age[gt][]", "unknown parameter");
        let body = serde_json::to_value(ErrorResponse::from(RestError::Validation(errors))).unwrap();

        assert_eq!(body["code"], 422);
        assert_eq!(body["details"][0]["param"], "age[gt][]");
        assert_eq!(body["details"][0]["message"], "unknown parameter");
    }
}
