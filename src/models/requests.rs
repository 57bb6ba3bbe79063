//! Request DTOs for the cache API
//!
//! Defines the query parameters of incoming HTTP requests.

use serde::Deserialize;

/// Query string of `GET /cache` and `PUT /cache`
///
/// # Fields
/// - `key`: The cache key, conventionally the full request URL
///
/// A missing `key` deserializes as empty so it fails [`validate`](Self::validate)
/// with the JSON error body instead of a plain-text extractor rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyQuery {
    /// The cache key
    #[serde(default)]
    pub key: String,
}

impl KeyQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.trim().is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}
