//! Cache Entry Module
//!
//! Defines a single memoized response together with its creation time and size.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A stored payload plus the metadata needed for eviction and expiry.
///
/// On disk an entry is `{"created_at": <RFC3339>, "val": <base64>, "size": <int>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Insertion time, never refreshed by reads
    pub created_at: DateTime<Utc>,
    /// The stored payload
    #[serde(with = "base64_bytes")]
    pub val: Vec<u8>,
    /// Payload length in bytes
    pub size: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(val: Vec<u8>) -> Self {
        Self::with_created_at(val, Utc::now())
    }

    /// Creates an entry with an explicit creation time.
    pub fn with_created_at(val: Vec<u8>, created_at: DateTime<Utc>) -> Self {
        let size = val.len() as u64;
        Self {
            created_at,
            val,
            size,
        }
    }

    // == Age ==
    /// Time elapsed between creation and `now`; zero if `now` is earlier.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    // == Is Expired ==
    /// Returns `true` once the entry is strictly older than `expire_after`.
    pub fn is_expired(&self, now: DateTime<Utc>, expire_after: Duration) -> bool {
        self.age(now) > expire_after
    }
}

// == Serde Helpers ==
/// Serializes byte payloads as standard padded base64 strings.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        match encoded {
            Some(s) => STANDARD.decode(s.as_bytes()).map_err(de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
