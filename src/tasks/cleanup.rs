//! Expiry Cleanup Task
//!
//! Background task that periodically removes expired cache entries from
//! storage, so stale responses do not occupy quota until they are next read.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{blocking, SharedCache};

/// Spawns a background task that periodically clears expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between passes. Each pass runs `clear_expired` on the blocking pool and
/// holds the write lock only for its duration.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = PersistentCache::new(storage, CacheConfig::default()).into_shared();
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 3600);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedCache, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = blocking::write(&cache, |cache| cache.clear_expired())
                .await
                .unwrap_or(0);

            if removed > 0 {
                info!("Expiry cleanup: removed {} expired entries", removed);
            } else {
                debug!("Expiry cleanup: no expired entries found");
            }
        }
    })
}
