//! API Handlers
//!
//! HTTP request handlers exposing the cache to fetch clients.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};
use crate::models::{
    AddResponse, ClearResponse, HealthResponse, KeyQuery, SizeResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The store synchronizes internally, so handlers share it through an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheStore>,
}

impl AppState {
    /// Creates a new AppState around a shared store.
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }
}

/// Runs a store operation that may touch the disk off the async workers.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&CacheStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let cache = Arc::clone(&state.cache);
    tokio::task::spawn_blocking(move || op(&cache))
        .await
        .map_err(|e| CacheError::Internal(format!("cache task failed: {}", e)))?
}

fn validated(query: KeyQuery) -> Result<String> {
    match query.validate() {
        Some(msg) => Err(CacheError::InvalidRequest(msg)),
        None => Ok(query.key),
    }
}

/// Handler for `GET /cache?key=...`
///
/// Returns the cached payload as `application/octet-stream`.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response> {
    let key = validated(query)?;

    match state.cache.get(&key) {
        Some(value) => Ok((
            [(header::CONTENT_TYPE, "application/octet-stream")],
            value,
        )
            .into_response()),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for `PUT /cache?key=...`
///
/// Stores the raw request body under the key. Bodies cut off by the router's
/// body limit are reported as a JSON 413 like any other oversized item.
pub async fn add_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<AddResponse>> {
    let key = validated(query)?;
    let body = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => CacheError::BodyTooLarge {
            max: state.cache.max_size(),
        },
        _ => CacheError::InvalidRequest(rejection.body_text()),
    })?;
    let size = body.len();

    let stored_key = key.clone();
    blocking(&state, move |cache| cache.add(stored_key, body.to_vec())).await?;

    Ok(Json(AddResponse::new(key, size)))
}

/// Handler for `DELETE /cache`
///
/// Empties the in-memory table; the file is left alone.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear_memory_cache();
    Json(ClearResponse::memory())
}

/// Handler for `DELETE /cache/dir`
pub async fn delete_dir_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    blocking(&state, |cache| cache.delete_cache_dir()).await?;
    Ok(Json(ClearResponse::directory()))
}

/// Handler for `GET /cache/size`
pub async fn size_handler(State(state): State<AppState>) -> Result<Json<SizeResponse>> {
    let size_mib = state.cache.cache_size_mib()?;
    Ok(Json(SizeResponse { size_mib }))
}

/// Handler for `GET /stats`
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
