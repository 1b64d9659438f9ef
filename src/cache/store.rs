//! Cache Store Module
//!
//! Main cache engine: namespaced entries over a storage substrate with TTL
//! expiry, capacity eviction by insertion time, and quota recovery.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::outcome::{Degradation, Lookup, WriteOutcome};
use crate::cache::{
    CacheConfig, CacheCounters, CacheEntry, CacheStats, Clock, EntryInfo, EntryMeta, SystemClock,
    QUOTA_EVICTION_PERCENT,
};
use crate::storage::Storage;

/// A cache shared between tasks. Every operation runs under the lock, which
/// makes each one atomic with respect to the others.
pub type SharedCache = Arc<RwLock<PersistentCache>>;

/// A namespaced entry found while scanning storage.
#[derive(Debug)]
struct ScannedEntry {
    full_key: String,
    key: String,
    meta: EntryMeta,
    size_bytes: usize,
}

// == Persistent Cache ==
/// Key/value cache over a persistent store.
///
/// Storage failures never reach the caller: reads degrade to a miss and
/// writes are dropped, with the reason logged.
#[derive(Debug)]
pub struct PersistentCache {
    /// Underlying substrate, possibly shared with unrelated data
    storage: Box<dyn Storage>,
    /// Time source for timestamps and expiry checks
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    counters: CacheCounters,
}

impl PersistentCache {
    // == Constructor ==
    /// Creates a cache over `storage` using wall-clock time.
    pub fn new(storage: impl Storage + 'static, config: CacheConfig) -> Self {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit time source.
    pub fn with_clock(
        storage: impl Storage + 'static,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage: Box::new(storage),
            clock,
            config,
            counters: CacheCounters::default(),
        }
    }

    /// Wraps the cache for sharing across tasks.
    pub fn into_shared(self) -> SharedCache {
        Arc::new(RwLock::new(self))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    // == Set ==
    /// Stores `payload` under `key`, replacing any previous entry.
    ///
    /// Best effort: if storage refuses the write it is logged and dropped.
    pub fn set(&mut self, key: &str, payload: Value) {
        self.store(key, payload);
    }

    pub(crate) fn store(&mut self, key: &str, payload: Value) -> WriteOutcome {
        let entry = CacheEntry::new(payload, self.now(), self.config.ttl);
        let raw = match entry.to_json() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache storage failed for {}: {}", key, e);
                self.counters.record_dropped_write();
                return WriteOutcome::Dropped(Degradation::CorruptEntry(e.to_string()));
            }
        };
        let full_key = self.full_key(key);

        match self.storage.write(&full_key, &raw) {
            Ok(()) => {
                debug!("Cached: {} (ttl {}s)", key, self.config.ttl.as_secs());
                let evicted = self.maintain_capacity();
                WriteOutcome::Stored { evicted }
            }
            Err(e) if e.is_quota_exceeded() => {
                warn!("Cache storage full while writing {}, evicting oldest entries", key);
                let evicted = self.evict_for_quota();
                match self.storage.write(&full_key, &raw) {
                    Ok(()) => {
                        info!("Cached after cleanup: {} ({} entries evicted)", key, evicted);
                        let trimmed = self.maintain_capacity();
                        WriteOutcome::Recovered {
                            evicted: evicted + trimmed,
                        }
                    }
                    Err(retry_err) => {
                        error!("Cache storage failed even after cleanup for {}: {}", key, retry_err);
                        self.counters.record_dropped_write();
                        WriteOutcome::Dropped(Degradation::Storage(retry_err))
                    }
                }
            }
            Err(e) => {
                warn!("Cache storage failed for {}: {}", key, e);
                self.counters.record_dropped_write();
                WriteOutcome::Dropped(Degradation::Storage(e))
            }
        }
    }

    // == Get ==
    /// Returns the payload for `key` if present and fresh.
    ///
    /// Expired and undecodable entries are deleted on the way out.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.lookup(key).into_option()
    }

    pub(crate) fn lookup(&mut self, key: &str) -> Lookup {
        let full_key = self.full_key(key);

        let outcome = match self.storage.read(&full_key) {
            Ok(None) => Lookup::Miss,
            Ok(Some(raw)) => match CacheEntry::from_json(&raw) {
                Ok(entry) if entry.is_expired_at(self.now()) => {
                    self.delete_raw(&full_key);
                    debug!("Cache expired: {}", key);
                    Lookup::Expired
                }
                Ok(entry) => {
                    debug!("Cache hit: {}", key);
                    Lookup::Hit(entry.payload)
                }
                Err(e) => {
                    warn!("Removing corrupt cache entry {}: {}", key, e);
                    self.delete_raw(&full_key);
                    Lookup::Degraded(Degradation::CorruptEntry(e.to_string()))
                }
            },
            Err(e) => {
                warn!("Cache retrieval failed for {}: {}", key, e);
                Lookup::Degraded(Degradation::Storage(e))
            }
        };

        match outcome {
            Lookup::Hit(_) => self.counters.record_hit(),
            _ => self.counters.record_miss(),
        }
        outcome
    }

    /// True if `key` holds a fresh entry. Same side effects as `get`.
    pub fn contains(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Remove ==
    /// Deletes `key` if present.
    pub fn remove(&mut self, key: &str) {
        let full_key = self.full_key(key);
        if self.delete_raw(&full_key) {
            debug!("Removed cache entry: {}", key);
        }
    }

    /// Time since `key` was stored, ignoring expiry. Does not clean up.
    pub fn entry_age(&self, key: &str) -> Option<Duration> {
        let raw = self.storage.read(&self.full_key(key)).ok()??;
        let stored_at = EntryMeta::parse(&raw).stored_at?;
        Some(Duration::from_millis(self.now().saturating_sub(stored_at)))
    }

    // == Cleanup Expired ==
    /// Removes every expired entry and returns how many were removed.
    ///
    /// Entries whose expiry cannot be read count as expired.
    pub fn clear_expired(&mut self) -> usize {
        let now = self.now();
        let removed = self
            .scan()
            .into_iter()
            .filter(|entry| entry.meta.is_expired_at(now))
            .filter(|entry| self.delete_raw(&entry.full_key))
            .count();

        if removed > 0 {
            info!("Cleared {} expired cache entries", removed);
        }
        removed
    }

    // == Clear All ==
    /// Removes every namespaced entry and returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self
            .scan()
            .into_iter()
            .filter(|entry| self.delete_raw(&entry.full_key))
            .count();

        info!("Cleared all cache ({} entries)", removed);
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the cache contents. Never deletes anything.
    pub fn stats(&self) -> CacheStats {
        let now = self.now();
        let mut entries = self.scan();
        sort_oldest_first(&mut entries);

        let info = |entry: &ScannedEntry| {
            EntryInfo::new(
                entry.key.clone(),
                entry.full_key.clone(),
                entry.meta.stored_at,
                entry.meta.expires_at,
            )
        };

        CacheStats {
            total_items: entries.len(),
            expired_items: entries.iter().filter(|e| e.meta.is_expired_at(now)).count(),
            total_size_bytes: entries.iter().map(|e| e.size_bytes).sum(),
            oldest_entry: entries.first().map(info),
            newest_entry: entries.last().map(info),
            counters: self.counters,
        }
    }

    // == Init ==
    /// Startup pass: drops expired entries and logs what is left.
    pub fn init(&mut self) -> CacheStats {
        let removed = self.clear_expired();
        let stats = self.stats();
        info!(
            "Cache initialized: {} items, ~{}KB ({} expired removed)",
            stats.total_items,
            stats.approx_kib(),
            removed
        );
        stats
    }

    // == Length ==
    /// Number of namespaced entries in storage, fresh or not.
    pub fn len(&self) -> usize {
        self.namespaced_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Maintenance ==
    /// Deletes the oldest entries beyond `max_entries`.
    fn maintain_capacity(&mut self) -> usize {
        let mut entries = self.scan();
        if entries.len() <= self.config.max_entries {
            return 0;
        }

        let excess = entries.len() - self.config.max_entries;
        sort_oldest_first(&mut entries);
        let removed = self.evict(&entries[..excess]);
        info!("Cache size limit: removed {} entries", removed);
        removed
    }

    /// Deletes the oldest `QUOTA_EVICTION_PERCENT` of entries, at least one.
    fn evict_for_quota(&mut self) -> usize {
        let mut entries = self.scan();
        if entries.is_empty() {
            return 0;
        }

        let to_remove = ((entries.len() * QUOTA_EVICTION_PERCENT).div_ceil(100)).max(1);
        sort_oldest_first(&mut entries);
        self.evict(&entries[..to_remove])
    }

    fn evict(&mut self, victims: &[ScannedEntry]) -> usize {
        let mut removed = 0;
        for victim in victims {
            if self.delete_raw(&victim.full_key) {
                debug!("Evicted cache entry: {}", victim.key);
                removed += 1;
            }
        }
        self.counters.record_evictions(removed);
        removed
    }

    fn delete_raw(&self, full_key: &str) -> bool {
        match self.storage.delete(full_key) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to delete cache entry {}: {}", full_key, e);
                false
            }
        }
    }

    fn namespaced_keys(&self) -> Vec<String> {
        match self.storage.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.config.prefix))
                .collect(),
            Err(e) => {
                warn!("Failed to list cache keys: {}", e);
                Vec::new()
            }
        }
    }

    /// Reads metadata for every namespaced entry without modifying storage.
    fn scan(&self) -> Vec<ScannedEntry> {
        let prefix_len = self.config.prefix.len();
        let mut entries = Vec::new();

        for full_key in self.namespaced_keys() {
            let (meta, size_bytes) = match self.storage.read(&full_key) {
                Ok(Some(raw)) => (EntryMeta::parse(&raw), raw.len()),
                // Removed by someone else since the listing
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to read cache entry {}: {}", full_key, e);
                    (EntryMeta::default(), 0)
                }
            };
            entries.push(ScannedEntry {
                key: full_key[prefix_len..].to_string(),
                full_key,
                meta,
                size_bytes,
            });
        }
        entries
    }
}

/// Ascending `stored_at`; equal timestamps fall back to key order.
fn sort_oldest_first(entries: &mut [ScannedEntry]) {
    entries.sort_by(|a, b| {
        a.meta
            .eviction_rank()
            .cmp(&b.meta.eviction_rank())
            .then_with(|| a.key.cmp(&b.key))
    });
}
