//! Error types for the cache backends
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for every cache backend and the HTTP surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Operation required an existing key and none exists
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Key existed but its TTL had elapsed; it has been evicted
    #[error("Key expired: {0}")]
    KeyExpired(String),

    /// Remote backend could not be reached, or its connection is closed
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The caller's cancellation token fired before or during the call
    #[error("Operation cancelled")]
    Cancelled,

    /// Unrecognized or malformed construction parameters (strict mode only)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Remote backend rejected or failed an operation
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid request data at the HTTP surface
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Stable snake_case label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::KeyNotFound(_) => "key_not_found",
            CacheError::KeyExpired(_) => "key_expired",
            CacheError::BackendUnavailable(_) => "backend_unavailable",
            CacheError::Cancelled => "cancelled",
            CacheError::InvalidConfiguration(_) => "invalid_configuration",
            CacheError::Backend(_) => "backend",
            CacheError::InvalidRequest(_) => "invalid_request",
            CacheError::Internal(_) => "internal",
        }
    }

    /// True for the two "no usable value" kinds some callers treat as informational.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::KeyNotFound(_) | CacheError::KeyExpired(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        // Only malformed requests are the client's fault; every backend
        // failure is a server error, with `kind` keeping misses distinguishable.
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string(), self.kind()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
