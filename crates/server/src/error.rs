//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable reason.
    pub reason: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    WrongContent(String),

    #[error("failed to retrieve dist package: {0}")]
    Fetch(#[from] pantry_fetch::FetchError),

    #[error("storage error: {0}")]
    Storage(#[from] pantry_storage::StorageError),

    #[error("registry error: {0}")]
    Registry(#[from] pantry_registry::RegistryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::WrongContent(_) => "wrong_content",
            Self::Fetch(_) => "fetch_failed",
            Self::Storage(e) => match e {
                pantry_storage::StorageError::NotFound(_) => "not_found",
                _ => "storage_error",
            },
            Self::Registry(_) => "registry_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::WrongContent(_) => StatusCode::BAD_REQUEST,
            Self::Fetch(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(e) => match e {
                pantry_storage::StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code().to_string(),
            reason: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
