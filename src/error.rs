//! Error types for the cache and resolver layers
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == App Error Enum ==
/// Unified error type for the cache facade, remote tier and HTTP layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Operation referenced a cache group that was never configured
    #[error("Cache group not configured: {0}")]
    ConfigMissing(String),

    /// A value could not be serialized or deserialized
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Remote key-value store failure (anything other than "not found")
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Key not found in either tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid startup configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A collaborator needed for the request is not configured
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Remote(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::ConfigMissing(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Remote(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Encoding(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, AppError>;

// == Resolve Error Enum ==
/// Failure to turn one storage reference into a signed URL.
///
/// Never escapes the fan-out resolver; a failed reference becomes an absent URL.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Request could not be sent or the body could not be read
    #[error("signing request failed: {0}")]
    Transport(String),

    /// Signing service answered with a non-200 status
    #[error("signing service returned HTTP {0}")]
    Status(u16),

    /// Signing service answered with a non-zero errcode
    #[error("signing service error {code}: {message}")]
    Service { code: i64, message: String },

    /// Successful envelope without a `data` payload
    #[error("signing service returned no url")]
    MissingData,

    /// All attempts together exceeded the configured deadline
    #[error("signing request timed out")]
    Timeout,
}
