//! API Module
//!
//! HTTP handlers and routing for the cache daemon.
//!
//! # Endpoints
//! - `GET /cache?key=` - Fetch a cached payload
//! - `PUT /cache?key=` - Store a payload
//! - `DELETE /cache` - Clear the in-memory table
//! - `DELETE /cache/dir` - Delete the persisted cache
//! - `GET /cache/size` - On-disk size in MiB
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
