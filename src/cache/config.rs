//! Cache Configuration
//!
//! Per-instance settings for a `PersistentCache`.

use std::time::Duration;

/// Entries live for three days.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Maximum number of entries kept in the store.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Namespace separating this cache's keys from other data in the same store.
pub const DEFAULT_KEY_PREFIX: &str = "motor_nation_";

/// Percentage of entries dropped when the store reports it is full.
pub const QUOTA_EVICTION_PERCENT: usize = 30;

// == Cache Config ==
/// TTL, capacity bound and namespace of one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry stays fresh after it is stored
    pub ttl: Duration,
    /// Upper bound on stored entries, enforced after every write
    pub max_entries: usize,
    /// Prefix applied to every key written to storage
    pub prefix: String,
}

impl CacheConfig {
    pub fn new(ttl: Duration, max_entries: usize, prefix: impl Into<String>) -> Self {
        Self {
            ttl,
            max_entries,
            prefix: prefix.into(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES, DEFAULT_KEY_PREFIX)
    }
}
