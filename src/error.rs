//! Error types for the caching layer
//!
//! `CacheError` is what the debug HTTP surface reports; `StoreError` covers
//! shared-store faults, which never travel past the shared cache client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors returned by the administrative HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Store Error Enum ==
/// Faults raised by a shared key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store rejected or failed a command
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A value could not be encoded to or decoded from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store did not answer in time
    #[error("Store operation timed out after {0} ms")]
    Timeout(u64),

    /// The store replied with something we could not interpret
    #[error("Unexpected store response: {0}")]
    Protocol(String),
}

// == Result Type Aliases ==
/// Convenience Result type for the HTTP surface.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type for shared-store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response = CacheError::InvalidRequest("pattern cannot be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_error_messages() {
        assert_eq!(
            StoreError::Timeout(2000).to_string(),
            "Store operation timed out after 2000 ms"
        );
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(StoreError::from(json_err)
            .to_string()
            .starts_with("Serialization error"));
    }
}
