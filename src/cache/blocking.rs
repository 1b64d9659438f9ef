//! Blocking-pool access to a `SharedCache`
//!
//! Cache operations call into storage synchronously, and `FileStorage` does
//! file I/O. These helpers take the lock and run the operation on tokio's
//! blocking pool so runtime workers are never stalled on the disk.

use tokio::task;
use tracing::error;

use super::{PersistentCache, SharedCache};

/// Runs `op` under the write lock on the blocking pool.
///
/// Returns `None` if `op` panicked; the cache itself stays usable.
pub async fn write<R, F>(cache: &SharedCache, op: F) -> Option<R>
where
    F: FnOnce(&mut PersistentCache) -> R + Send + 'static,
    R: Send + 'static,
{
    let cache = cache.clone();
    match task::spawn_blocking(move || op(&mut cache.blocking_write())).await {
        Ok(result) => Some(result),
        Err(e) => {
            error!("Cache operation failed: {}", e);
            None
        }
    }
}

/// Runs `op` under the read lock on the blocking pool.
pub async fn read<R, F>(cache: &SharedCache, op: F) -> Option<R>
where
    F: FnOnce(&PersistentCache) -> R + Send + 'static,
    R: Send + 'static,
{
    let cache = cache.clone();
    match task::spawn_blocking(move || op(&cache.blocking_read())).await {
        Ok(result) => Some(result),
        Err(e) => {
            error!("Cache operation failed: {}", e);
            None
        }
    }
}
