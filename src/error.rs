//! Error types for the response cache
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
/// Unified error type for the response cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Item is larger than the whole cache budget
    #[error("Item size {size} bytes exceeds cache max size {max} bytes")]
    ItemTooLarge { size: u64, max: u64 },

    /// Request body was cut off at the body limit before it was fully read
    #[error("Request body exceeds cache max size {max} bytes")]
    BodyTooLarge { max: u64 },

    /// Key or backing file not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The store has no backing file (cache directory could not be created)
    #[error("Persistence is disabled for this cache")]
    PersistenceDisabled,

    /// Filesystem failure while reading or writing the cache file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted table could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::ItemTooLarge { .. } | CacheError::BodyTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::PersistenceDisabled => StatusCode::CONFLICT,
            CacheError::Io(_) | CacheError::Serialization(_) | CacheError::Internal(_) => {
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
/// Convenience Result type for the response cache.
pub type Result<T> = std::result::Result<T, CacheError>;
