//! Configuration Module
//!
//! Cache tuning knobs and the daemon configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// == Defaults ==
pub const DEFAULT_PROJECT_NAME: &str = "unnamed-project";
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_FILE_EXTENSION: &str = "json";
pub const DEFAULT_EXPIRE_AFTER: Duration = Duration::from_secs(30 * 60);

// == Cache Config ==
/// Construction-time configuration of a cache store.
///
/// Zero or empty values are treated as "unset" and replaced by the defaults
/// when the store is built (see [`CacheConfig::normalized`]).
///
/// ```rust
/// use response_cache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::default()
///     .with_project_name("gamehub")
///     .with_compression(true)
///     .with_expire_after(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Namespace used to derive the cache directory name
    pub project_name: String,
    /// Period of the background reaper
    pub cleanup_interval: Duration,
    /// Byte budget for all resident payloads
    pub max_size: u64,
    /// On-disk suffix when uncompressed
    pub file_extension: String,
    /// Gzip the persisted table
    pub compression: bool,
    /// Entry time-to-live
    pub expire_after: Duration,
    /// Explicit base directory, bypassing platform lookup
    pub cache_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            max_size: DEFAULT_MAX_SIZE,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            compression: false,
            expire_after: DEFAULT_EXPIRE_AFTER,
            cache_path: None,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    pub fn with_file_extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extension = ext.into();
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    pub fn with_expire_after(mut self, ttl: Duration) -> Self {
        self.expire_after = ttl;
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    // == Normalize ==
    /// Replaces unset (zero or empty) values with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.project_name.is_empty() {
            self.project_name = DEFAULT_PROJECT_NAME.to_string();
        }
        if self.cleanup_interval.is_zero() {
            self.cleanup_interval = DEFAULT_CLEANUP_INTERVAL;
        }
        if self.max_size == 0 {
            self.max_size = DEFAULT_MAX_SIZE;
        }
        if self.file_extension.is_empty() {
            self.file_extension = DEFAULT_FILE_EXTENSION.to_string();
        }
        if self.expire_after.is_zero() {
            self.expire_after = DEFAULT_EXPIRE_AFTER;
        }
        if matches!(&self.cache_path, Some(p) if p.as_os_str().is_empty()) {
            self.cache_path = None;
        }
        self
    }
}

// == Daemon Config ==
/// Configuration of the cache daemon.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Cache store settings
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_PROJECT_NAME` - Cache namespace (default: unnamed-project)
    /// - `CACHE_CLEANUP_INTERVAL` - Reaper period in seconds (default: 1800)
    /// - `CACHE_MAX_SIZE` - Byte budget (default: 10 MiB)
    /// - `CACHE_FILE_EXTENSION` - Uncompressed file suffix (default: json)
    /// - `CACHE_COMPRESSION` - Gzip the cache file (default: false)
    /// - `CACHE_EXPIRE_AFTER` - Entry TTL in seconds (default: 1800)
    /// - `CACHE_PATH` - Base directory override (default: platform cache dir)
    pub fn from_env() -> Self {
        let defaults = CacheConfig::default();

        let cache = CacheConfig {
            project_name: env::var("CACHE_PROJECT_NAME").unwrap_or(defaults.project_name),
            cleanup_interval: parse_env::<u64>("CACHE_CLEANUP_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            max_size: parse_env("CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            file_extension: env::var("CACHE_FILE_EXTENSION").unwrap_or(defaults.file_extension),
            compression: env::var("CACHE_COMPRESSION")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.compression),
            expire_after: parse_env::<u64>("CACHE_EXPIRE_AFTER")
                .map(Duration::from_secs)
                .unwrap_or(defaults.expire_after),
            cache_path: env::var("CACHE_PATH").ok().map(PathBuf::from),
        };

        Self {
            server_port: parse_env("SERVER_PORT").unwrap_or(3000),
            cache: cache.normalized(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache: CacheConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
