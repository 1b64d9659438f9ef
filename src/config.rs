//! Configuration Module
//!
//! Handles loading and managing sidecar configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CacheConfig, DEFAULT_KEY_PREFIX, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::storage::FileStorage;

/// Default storage budget: 5 MiB, roughly a browser's per-origin allowance.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Used when no platform cache directory can be determined.
const FALLBACK_CACHE_DIR: &str = ".motor_cache";

/// Sidecar configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Time-to-live for cached responses, in seconds
    pub ttl_secs: u64,
    /// Maximum number of entries the cache keeps
    pub max_entries: usize,
    /// Namespace prefix for cache keys in storage
    pub prefix: String,
    /// Directory holding the on-disk store
    pub cache_dir: PathBuf,
    /// Storage quota in bytes; 0 disables it
    pub quota_bytes: u64,
    /// Base URL of the content API
    pub api_base_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Warm the cache with common data at startup
    pub preload_on_start: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Entry lifetime in seconds (default: 259200, three days)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 50)
    /// - `CACHE_PREFIX` - Storage key prefix (default: `motor_nation_`)
    /// - `CACHE_DIR` - Store directory (default: platform cache dir)
    /// - `CACHE_QUOTA_BYTES` - Store quota, 0 for none (default: 5 MiB)
    /// - `API_BASE_URL` - Content API root (default: `http://localhost:3000/api`)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 3600)
    /// - `PRELOAD_ON_START` - Preload common data (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_secs: env_or("CACHE_TTL_SECS", defaults.ttl_secs),
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries),
            prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.prefix),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            quota_bytes: env_or("CACHE_QUOTA_BYTES", defaults.quota_bytes),
            api_base_url: env::var("API_BASE_URL").unwrap_or(defaults.api_base_url),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            preload_on_start: env_or("PRELOAD_ON_START", defaults.preload_on_start),
        }
    }

    /// Cache policy derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(
            Duration::from_secs(self.ttl_secs),
            self.max_entries,
            self.prefix.clone(),
        )
    }

    /// The on-disk store described by this configuration.
    pub fn file_storage(&self) -> FileStorage {
        let storage = FileStorage::new(&self.cache_dir);
        match self.quota_bytes {
            0 => storage,
            quota => storage.with_quota(quota),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
            max_entries: DEFAULT_MAX_ENTRIES,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            cache_dir: FileStorage::default_dir()
                .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR)),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            api_base_url: "http://localhost:3000/api".to_string(),
            server_port: 8080,
            cleanup_interval: 3600,
            preload_on_start: false,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
