//! Response Cache - memoizes external HTTP responses
//!
//! A size-bounded, time-expiring key/value store persisted to a single
//! (optionally gzipped) JSON file, with a background reaper for expired
//! entries. Keys are request URLs, values are raw response bodies.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheStore};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::{spawn_reaper, ReaperHandle};
