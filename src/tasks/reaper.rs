//! Expiry Reaper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

// == Reaper Handle ==
/// Control handle for a running reaper.
///
/// Dropping the handle closes the stop channel, which also ends the task.
#[derive(Debug)]
pub struct ReaperHandle {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signals the reaper to stop without waiting for it.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Signals the reaper to stop and waits until it has exited.
    pub async fn stop(self) {
        self.signal_stop();
        if let Err(e) = self.handle.await {
            warn!("Reaper task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns a task that sweeps expired entries out of `store` every `interval`.
///
/// The first sweep happens one full interval after spawning. A sweep holds
/// the store's table lock for its duration and never touches the file.
///
/// # Example
/// ```ignore
/// let store = Arc::new(CacheStore::new(CacheConfig::default()));
/// let reaper = spawn_reaper(store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// reaper.stop().await;
/// ```
pub fn spawn_reaper(store: Arc<CacheStore>, interval: Duration) -> ReaperHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!("Starting cache reaper with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.reap_expired();
                    if removed > 0 {
                        info!("Cache reaper: removed {} expired entries", removed);
                    } else {
                        debug!("Cache reaper: no expired entries found");
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Cache reaper stopped");
    });

    ReaperHandle { stop_tx, handle }
}
