//! Storage Module
//!
//! The persistent key/value substrate underneath the cache. The cache does not
//! own the substrate exclusively: other code may write, clear, or corrupt keys,
//! so every implementation is addressed through raw string keys and the cache
//! namespaces its own.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

// == Storage Error ==
/// Failures reported by a storage substrate.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The write was refused because the substrate is full
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    /// The substrate cannot be used at all
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Any other I/O failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True for capacity failures, the only class the cache retries.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded)
    }
}

/// Convenience Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

// == Storage Trait ==
/// A synchronous string key/value store.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Returns the raw value for `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<()>;

    /// Lists every key currently in the store, including foreign ones.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}
