/// Error types for Interaction Service
///
/// Expected outcomes (duplicate like, missing like, rejected content) are not
/// errors; they are returned as typed outcomes by the service. The variants
/// below are what remains, converted to HTTP responses at the boundary.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::db::{Reference, StoreError};

/// Result type for interaction-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or empty input, rejected before any external call
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Classifier could not be consulted; write path only
    #[error("Moderation unavailable: {0}")]
    ModerationUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message safe to return to clients. Server-side detail stays in the log.
    fn public_message(&self) -> String {
        match self {
            AppError::ModerationUnavailable(_) => {
                "content moderation is temporarily unavailable".to_string()
            }
            AppError::Database(_) | AppError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ModerationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // A failed post shares the string `status` tag of stored/rejected
        let body = match self {
            AppError::ModerationUnavailable(_) => serde_json::json!({
                "status": "failed",
                "error": self.public_message(),
            }),
            _ => serde_json::json!({
                "error": self.public_message(),
                "status": status.as_u16(),
            }),
        };

        HttpResponse::build(status).json(body)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingReference(Reference::ParentPost) => {
                AppError::NotFound("parent post not found".to_string())
            }
            StoreError::MissingReference(Reference::Post) => {
                AppError::NotFound("post not found".to_string())
            }
            StoreError::MissingReference(Reference::User) => {
                AppError::Validation("a profile is required before interacting".to_string())
            }
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        AppError::Validation(format!("invalid field(s): {}", fields.join(", ")))
    }
}
