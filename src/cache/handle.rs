//! Cache Handle Module
//!
//! Pairs a shared [`CacheStore`] with its running reaper.

use std::ops::Deref;
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::CacheConfig;
use crate::tasks::{spawn_reaper, ReaperHandle};

// == Cache ==
/// A cache store plus the background task that expires its entries.
///
/// Dereferences to [`CacheStore`], so `get`/`add` and the auxiliary
/// operations are called on the handle directly. Dropping the handle
/// signals the reaper to stop; [`Cache::shutdown`] also waits for it.
///
/// Must be created inside a Tokio runtime.
///
/// ```rust,no_run
/// use response_cache::{Cache, CacheConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let cache = Cache::new(CacheConfig::default().with_project_name("gamehub"));
///     if cache.get("https://example.com/api").is_none() {
///         let _ = cache.add("https://example.com/api", b"{}".to_vec());
///     }
///     cache.shutdown().await;
/// }
/// ```
#[derive(Debug)]
pub struct Cache {
    store: Arc<CacheStore>,
    reaper: ReaperHandle,
}

impl Cache {
    // == Constructor ==
    /// Builds the store (loading persisted state) and starts the reaper.
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(CacheStore::new(config));
        let reaper = spawn_reaper(Arc::clone(&store), store.config().cleanup_interval);
        Self { store, reaper }
    }

    /// Shared reference to the underlying store.
    pub fn store(&self) -> Arc<CacheStore> {
        Arc::clone(&self.store)
    }

    /// Returns `true` while the reaper task is still running.
    pub fn reaper_running(&self) -> bool {
        !self.reaper.is_finished()
    }

    // == Shutdown ==
    /// Stops the reaper and waits for it to exit. The store stays usable
    /// through any outstanding [`Cache::store`] references.
    pub async fn shutdown(self) {
        self.reaper.stop().await;
    }
}

impl Deref for Cache {
    type Target = CacheStore;

    fn deref(&self) -> &CacheStore {
        &self.store
    }
}
