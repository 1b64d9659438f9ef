//! Cache Entry Module
//!
//! Defines the persisted shape of a cache entry and the lenient metadata view
//! used by maintenance scans.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A single cached API response with its timestamps.
///
/// Serialized as `{"data": ..., "timestamp": ..., "expiry": ...}` so entries
/// written by earlier clients of the same store stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload
    #[serde(rename = "data")]
    pub payload: Value,
    /// Creation timestamp (Unix milliseconds)
    #[serde(rename = "timestamp")]
    pub stored_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    #[serde(rename = "expiry")]
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stored at `now_ms` that expires `ttl` later.
    pub fn new(payload: Value, now_ms: u64, ttl: Duration) -> Self {
        Self {
            payload,
            stored_at: now_ms,
            expires_at: now_ms.saturating_add(ttl.as_millis() as u64),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time reaches `expires_at`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Remaining lifetime at `now_ms`, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Time since the entry was stored.
    pub fn age_at(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.stored_at))
    }

    // == Encoding ==
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

// == Entry Metadata ==
/// Timestamps recovered from a raw stored value, tolerating damage.
///
/// Missing or non-numeric fields come back as `None` instead of failing the
/// whole parse, so a scan can still rank and expire the entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMeta {
    pub stored_at: Option<u64>,
    pub expires_at: Option<u64>,
}

impl EntryMeta {
    /// Extracts timestamps from a raw value. Unparseable JSON yields empty metadata.
    pub fn parse(raw: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return Self::default();
        };
        Self {
            stored_at: value.get("timestamp").and_then(Value::as_u64),
            expires_at: value.get("expiry").and_then(Value::as_u64),
        }
    }

    /// Missing expiry metadata counts as expired.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => true,
        }
    }

    /// Insertion time used for eviction ordering; unknown sorts oldest.
    pub fn eviction_rank(&self) -> u64 {
        self.stored_at.unwrap_or(0)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_entry_expiry_is_stored_at_plus_ttl() {
        let entry = CacheEntry::new(json!({"a": 1}), 1_000, TTL);
        assert_eq!(entry.stored_at, 1_000);
        assert_eq!(entry.expires_at, 61_000);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(json!(1), 0, TTL);
        assert!(!entry.is_expired_at(59_999));
        assert!(entry.is_expired_at(60_000), "Entry should be expired at boundary");
    }

    #[test]
    fn test_ttl_remaining_and_age() {
        let entry = CacheEntry::new(json!(null), 10_000, TTL);
        assert_eq!(entry.ttl_remaining_ms(40_000), 30_000);
        assert_eq!(entry.ttl_remaining_ms(90_000), 0);
        assert_eq!(entry.age_at(12_500), Duration::from_millis(2_500));
    }

    #[test]
    fn test_persisted_field_names() {
        let entry = CacheEntry::new(json!(["x"]), 5, TTL);
        let raw = entry.to_json().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["data"], json!(["x"]));
        assert_eq!(value["timestamp"], json!(5));
        assert_eq!(value["expiry"], json!(60_005));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(CacheEntry::from_json("{not json").is_err());
        assert!(CacheEntry::from_json(r#"{"data": 1}"#).is_err());
    }

    #[test]
    fn test_meta_tolerates_missing_fields() {
        let meta = EntryMeta::parse(r#"{"data": 1, "timestamp": 7}"#);
        assert_eq!(meta.stored_at, Some(7));
        assert_eq!(meta.expires_at, None);
        assert!(meta.is_expired_at(0));
    }

    #[test]
    fn test_meta_of_garbage_sorts_first() {
        let meta = EntryMeta::parse("\u{0}\u{1}");
        assert_eq!(meta, EntryMeta::default());
        assert_eq!(meta.eviction_rank(), 0);
    }
}
