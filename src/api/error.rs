//! API error types with structured JSON responses.
//!
//! Every failure leaving the Access Surface is one of these kinds; repository
//! errors are mapped here at the boundary, never passed through raw.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;

/// Structured error envelope, mirror of the success envelope shape.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
    pub meta: ErrorMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorMeta {
    pub timestamp: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Integrity violation: {0}")]
    Integrity(String),
    #[error("Aggregation failed: {0}")]
    Aggregation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                detail.clone(),
            ),
            ApiError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                detail.clone(),
            ),
            ApiError::NotFound(detail) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                detail.clone(),
            ),
            ApiError::Conflict(detail) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                detail.clone(),
            ),
            ApiError::Integrity(detail) => (
                StatusCode::CONFLICT,
                "INTEGRITY_ERROR",
                detail.clone(),
            ),
            ApiError::Aggregation(detail) => {
                tracing::error!(detail, "dashboard aggregation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AGGREGATION_FAILED",
                    "Dashboard snapshot could not be assembled; retry the request".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: ErrorDetail { code, message },
            meta: ErrorMeta {
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::InvalidEnum { field, value } => {
                ApiError::Validation(format!("invalid value for {field}: {value:?}"))
            }
            DatabaseError::UniqueViolation { field, value } => {
                ApiError::Conflict(format!("{field} already in use: {value}"))
            }
            DatabaseError::ForeignKeyViolation(detail) => ApiError::Integrity(detail),
            DatabaseError::ConstraintViolation(detail) => ApiError::Integrity(detail),
            DatabaseError::Sqlite(e) => ApiError::Internal(e.to_string()),
            DatabaseError::MigrationFailed { version, reason } => {
                ApiError::Internal(format!("migration v{version} failed: {reason}"))
            }
        }
    }
}
