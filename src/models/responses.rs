//! Response DTOs for the cache API
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for `PUT /cache`
#[derive(Debug, Clone, Serialize)]
pub struct AddResponse {
    /// Success message
    pub message: String,
    /// The key that was stored
    pub key: String,
    /// Payload size in bytes
    pub size: usize,
}

impl AddResponse {
    /// Creates a new AddResponse
    pub fn new(key: impl Into<String>, size: usize) -> Self {
        let key = key.into();
        Self {
            message: format!("Cached {} bytes for '{}'", size, key),
            key,
            size,
        }
    }
}

/// Response body for `DELETE /cache` and `DELETE /cache/dir`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
}

impl ClearResponse {
    pub fn memory() -> Self {
        Self {
            message: "In-memory cache cleared".to_string(),
        }
    }

    pub fn directory() -> Self {
        Self {
            message: "Cache directory deleted".to_string(),
        }
    }
}

/// Response body for `GET /cache/size`
#[derive(Debug, Clone, Serialize)]
pub struct SizeResponse {
    /// Size of the cache file on disk in MiB
    pub size_mib: f64,
}

/// Response body for the stats endpoint (`GET /stats`)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub rejections: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Resident payload bytes
    pub current_size: u64,
    /// Byte budget
    pub max_size: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            rejections: stats.rejections,
            total_entries: stats.total_entries,
            current_size: stats.current_size,
            max_size: stats.max_size,
        }
    }
}

/// Response body for the health endpoint (`GET /health`)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
