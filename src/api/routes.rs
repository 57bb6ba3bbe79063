//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_handler, clear_handler, delete_dir_handler, get_handler, health_handler, size_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache?key=` - Fetch a cached payload
/// - `PUT /cache?key=` - Store the request body
/// - `DELETE /cache` - Clear the in-memory table
/// - `DELETE /cache/dir` - Delete the cache directory and clear memory
/// - `GET /cache/size` - Size of the cache file in MiB
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// Request bodies are capped one byte above the cache budget. A body of
/// exactly `max_size + 1` bytes reaches the store and is rejected there; a
/// longer one is cut off by the limit. Both come back as a JSON 413.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = usize::try_from(state.cache.max_size())
        .unwrap_or(usize::MAX)
        .saturating_add(1);

    Router::new()
        .route(
            "/cache",
            get(get_handler).put(add_handler).delete(clear_handler),
        )
        .route("/cache/dir", delete(delete_dir_handler))
        .route("/cache/size", get(size_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
