//! Caching fetcher
//!
//! Read-through wrapper around an HTTP GET: answer from the cache when
//! possible, otherwise fetch, store and return.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use super::RequestOptions;
use crate::cache::{blocking, SharedCache};
use crate::error::FetchError;

/// Cache-first HTTP client for JSON resources.
///
/// The URL decides what is requested and the cache key decides where the
/// answer is stored; the two are independent. Concurrent misses on one key
/// are not coalesced: each goes to the network and the last write wins.
#[derive(Debug, Clone)]
pub struct CachingFetcher {
    client: Client,
    cache: SharedCache,
}

impl CachingFetcher {
    /// Creates a fetcher with a default `reqwest` client.
    pub fn new(cache: SharedCache) -> Self {
        Self::with_client(Client::new(), cache)
    }

    /// Creates a fetcher with a custom HTTP client.
    pub fn with_client(client: Client, cache: SharedCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Returns the cached payload for `cache_key`, or fetches `url`, caches
    /// the JSON body under `cache_key` and returns it.
    ///
    /// # Errors
    /// Network failures, non-2xx statuses and non-JSON bodies are returned as
    /// `FetchError`. A failed fetch never writes to the cache and never falls
    /// back to a stale entry.
    pub async fn fetch(
        &self,
        url: &str,
        cache_key: &str,
        options: &RequestOptions,
    ) -> Result<Value, FetchError> {
        // Lock released before any network I/O
        let key = cache_key.to_string();
        let cached = blocking::write(&self.cache, move |cache| cache.get(&key)).await;
        if let Some(payload) = cached.flatten() {
            return Ok(payload);
        }

        debug!("Fetching from server: {} (cache key {})", url, cache_key);
        let payload = self.fetch_uncached(url, options).await?;

        let key = cache_key.to_string();
        let stored = payload.clone();
        blocking::write(&self.cache, move |cache| cache.set(&key, stored)).await;
        Ok(payload)
    }

    /// Performs the network request without reading or writing the cache.
    pub async fn fetch_uncached(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Value, FetchError> {
        self.request(url, options)
            .await
            .inspect_err(|e| error!("Fetch failed for {}: {}", url, e))
    }

    async fn request(&self, url: &str, options: &RequestOptions) -> Result<Value, FetchError> {
        let response = self
            .client
            .request(options.method.clone(), url)
            .headers(options.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status,
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
