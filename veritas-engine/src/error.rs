//! Error types for the HTTP surface
//!
//! Every error renders as `{"error": {"code", "message"}}`; `NO_RESULTS`
//! additionally carries the per-model failures.

use crate::registry::RegistryError;
use crate::types::{DetectionError, ModelFailure};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Content kind could not be determined (400)
    #[error("Unrecognized content: {0}")]
    UnrecognizedContent(String),

    /// No registered model handles the content kind (422)
    #[error("{0}")]
    NoModelForKind(String),

    /// Every attempted model failed (502)
    #[error("No model produced a result")]
    NoResults(Vec<ModelFailure>),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<DetectionError> for ApiError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::UnrecognizedContent(msg) => ApiError::UnrecognizedContent(msg),
            e @ DetectionError::NoModelForKind(_) => ApiError::NoModelForKind(e.to_string()),
            DetectionError::NoResults { failures } => ApiError::NoResults(failures),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownModel(id) => ApiError::NotFound(format!("model '{}'", id)),
            e @ RegistryError::NoModelForKind(_) => ApiError::NotFound(e.to_string()),
            e @ RegistryError::DuplicateModel(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, failures) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::UnrecognizedContent(msg) => {
                (StatusCode::BAD_REQUEST, "UNRECOGNIZED_CONTENT", msg, None)
            }
            ApiError::NoModelForKind(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_MODEL_FOR_KIND",
                msg,
                None,
            ),
            ApiError::NoResults(failures) => (
                StatusCode::BAD_GATEWAY,
                "NO_RESULTS",
                format!("All {} attempted models failed", failures.len()),
                Some(failures),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
        };

        let body = match failures {
            Some(failures) => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                    "failures": failures,
                }
            }),
            None => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
