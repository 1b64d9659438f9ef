//! Motor Cache - client-side cache for the Motor Nation content API
//!
//! Persists JSON API responses with a three-day TTL and a bounded entry count,
//! recovers from storage quota errors by evicting the oldest entries, and
//! serves content requests read-through from that cache.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheConfig, PersistentCache, SharedCache};
pub use client::{ContentClient, ContentRequest};
pub use config::Config;
pub use error::FetchError;
pub use fetch::{CachingFetcher, RequestOptions};
pub use tasks::spawn_cleanup_task;
