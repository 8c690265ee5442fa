//! Error types for the image cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced to callers of the cache service.
///
/// Network and decode failures never show up here; they are absorbed by the
/// fetcher and turned into the fallback reference.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Durable storage could not be opened
    #[error("Store initialization failed: {0}")]
    StoreInitialization(String),

    /// A payload could not be persisted after a successful fetch
    #[error("Store write failed: {0}")]
    StoreWrite(String),

    /// Reading from or clearing durable storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The service was closed before the request could be served
    #[error("Service closed")]
    ServiceClosed,
}

// == Fetch Error Enum ==
/// Failure of a single load attempt inside the fetcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection-level failure reported by the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response completed with a non-success status
    #[error("HTTP error, status: {0}")]
    Status(u16),

    /// The response succeeded but carried no body
    #[error("Empty image payload")]
    EmptyPayload,

    /// The body was received but is not a readable image
    #[error("Unreadable image payload: {0}")]
    Decode(String),
}

impl FetchError {
    /// Only transport and validation failures are worth another attempt;
    /// the bytes of an undecodable payload will not change on retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Decode(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::StoreInitialization(_) | CacheError::ServiceClosed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::StoreWrite(_) | CacheError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the image cache.
pub type Result<T> = std::result::Result<T, CacheError>;
