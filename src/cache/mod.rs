//! Cache Module
//!
//! Persistent caching with TTL expiration and capacity eviction by insertion
//! time.

pub mod blocking;
mod clock;
mod config;
mod entry;
mod outcome;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use config::{
    CacheConfig, DEFAULT_KEY_PREFIX, DEFAULT_MAX_ENTRIES, DEFAULT_TTL, QUOTA_EVICTION_PERCENT,
};
pub use entry::{CacheEntry, EntryMeta};
pub use stats::{CacheCounters, CacheStats, EntryInfo};
pub use store::{PersistentCache, SharedCache};
