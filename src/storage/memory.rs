//! In-memory storage substrate.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Result, Storage, StorageError};

#[derive(Debug, Default)]
struct MemoryInner {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    unavailable: bool,
    forced_quota_failures: usize,
}

impl MemoryInner {
    fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

// == Memory Storage ==
/// A shared in-memory store with an optional byte quota.
///
/// Cloning returns another handle onto the same items, the way every script
/// in a browser origin sees one `localStorage`. Tests keep a handle to tamper
/// with raw values or to inject failures while the cache owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    /// Creates an empty store without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that refuses writes beyond `quota_bytes`
    /// (keys plus values).
    pub fn with_quota(quota_bytes: usize) -> Self {
        let storage = Self::default();
        storage.lock().quota_bytes = Some(quota_bytes);
        storage
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `count` writes fail with `QuotaExceeded`.
    pub fn fail_next_writes(&self, count: usize) {
        self.lock().forced_quota_failures = count;
    }

    /// Toggles whether every operation fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Writes a raw value, bypassing quota and availability checks.
    pub fn put_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().items.insert(key.into(), value.into());
    }

    /// Reads a raw value, bypassing availability checks.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.lock().items.get(key).cloned()
    }

    /// Number of keys held, namespaced or not.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Bytes counted against the quota.
    pub fn used_bytes(&self) -> usize {
        self.lock().used_bytes()
    }
}

fn unavailable() -> StorageError {
    StorageError::Unavailable("memory storage disabled".to_string())
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(unavailable());
        }
        Ok(inner.items.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.unavailable {
            return Err(unavailable());
        }
        if inner.forced_quota_failures > 0 {
            inner.forced_quota_failures -= 1;
            return Err(StorageError::QuotaExceeded);
        }
        if let Some(quota) = inner.quota_bytes {
            let replaced = inner
                .items
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let projected = inner.used_bytes() - replaced + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        inner.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.unavailable {
            return Err(unavailable());
        }
        inner.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(unavailable());
        }
        Ok(inner.items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let storage = MemoryStorage::new();
        storage.write("a", "1").unwrap();
        assert_eq!(storage.read("a").unwrap(), Some("1".to_string()));

        storage.delete("a").unwrap();
        assert_eq!(storage.read("a").unwrap(), None);
        // Deleting again is fine
        storage.delete("a").unwrap();
    }

    #[test]
    fn test_clones_share_items() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.write("shared", "yes").unwrap();
        assert_eq!(handle.get_raw("shared").as_deref(), Some("yes"));
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let storage = MemoryStorage::with_quota(10);
        storage.write("k", "12345").unwrap(); // 6 bytes

        let result = storage.write("j", "12345");
        assert!(matches!(result, Err(StorageError::QuotaExceeded)));
        assert!(storage.read("j").unwrap().is_none());
    }

    #[test]
    fn test_quota_counts_replacement_not_both_values() {
        let storage = MemoryStorage::with_quota(10);
        storage.write("k", "123456789").unwrap(); // exactly 10
        storage.write("k", "987654321").unwrap();
        assert_eq!(storage.used_bytes(), 10);
    }

    #[test]
    fn test_forced_failures_are_consumed() {
        let storage = MemoryStorage::new();
        storage.fail_next_writes(1);

        assert!(storage.write("k", "v").unwrap_err().is_quota_exceeded());
        assert!(storage.write("k", "v").is_ok());
    }

    #[test]
    fn test_unavailable_fails_everything() {
        let storage = MemoryStorage::new();
        storage.put_raw("k", "v");
        storage.set_unavailable(true);

        assert!(matches!(storage.read("k"), Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.write("k", "v"), Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.keys(), Err(StorageError::Unavailable(_))));
        assert!(!storage.write("x", "y").unwrap_err().is_quota_exceeded());
    }
}
