//! Cache Statistics Module
//!
//! Running counters plus the diagnostic snapshot returned by `stats()`.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Counters ==
/// Running totals since the cache instance was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    /// Lookups that returned a payload
    pub hits: u64,
    /// Lookups that returned nothing (absent, expired, corrupt or unreadable)
    pub misses: u64,
    /// Entries removed by capacity maintenance or quota recovery
    pub evictions: u64,
    /// Writes given up on after a storage failure
    pub dropped_writes: u64,
}

impl CacheCounters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_dropped_write(&mut self) {
        self.dropped_writes += 1;
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Entry Info ==
/// Identity and timestamps of one stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Logical key, without the namespace prefix
    pub key: String,
    /// Raw key in the storage substrate
    pub full_key: String,
    pub stored_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl EntryInfo {
    pub fn new(key: String, full_key: String, stored_at: Option<u64>, expires_at: Option<u64>) -> Self {
        Self {
            key,
            full_key,
            stored_at: stored_at.and_then(to_datetime),
            expires_at: expires_at.and_then(to_datetime),
        }
    }
}

fn to_datetime(ms: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(i64::try_from(ms).ok()?)
}

// == Cache Stats ==
/// Read-only snapshot of the cache contents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Namespaced entries currently in storage
    pub total_items: usize,
    /// Entries past their expiry, or with unreadable expiry metadata
    pub expired_items: usize,
    /// Approximate footprint: sum of raw value lengths
    pub total_size_bytes: usize,
    /// Entry with the smallest `stored_at`
    pub oldest_entry: Option<EntryInfo>,
    /// Entry with the largest `stored_at`
    pub newest_entry: Option<EntryInfo>,
    /// Running counters at the time of the snapshot
    pub counters: CacheCounters,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        self.counters.hit_rate()
    }

    /// Footprint rounded to whole KiB, for log lines.
    pub fn approx_kib(&self) -> usize {
        (self.total_size_bytes + 512) / 1024
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let counters = CacheCounters::default();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.misses, 0);
        assert_eq!(counters.evictions, 0);
        assert_eq!(counters.dropped_writes, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheCounters::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut counters = CacheCounters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_evictions() {
        let mut counters = CacheCounters::default();
        counters.record_evictions(15);
        counters.record_evictions(1);
        assert_eq!(counters.evictions, 16);
    }

    #[test]
    fn test_entry_info_converts_timestamps() {
        let info = EntryInfo::new("k".into(), "p_k".into(), Some(0), None);
        assert_eq!(info.stored_at.unwrap().timestamp(), 0);
        assert!(info.expires_at.is_none());
    }

    #[test]
    fn test_approx_kib_rounds() {
        let stats = CacheStats {
            total_size_bytes: 1536,
            ..Default::default()
        };
        assert_eq!(stats.approx_kib(), 2);
    }
}
