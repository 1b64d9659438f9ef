//! Content API client
//!
//! Typed access to the reviews/news/search endpoints, with every cacheable
//! call routed through the `CachingFetcher`.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use super::{ContentRequest, SearchScope};
use crate::cache::{blocking, CacheStats, SharedCache};
use crate::error::FetchError;
use crate::fetch::{CachingFetcher, RequestOptions};

/// Outcome of one request inside a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl From<Result<Value, FetchError>> for BatchResult {
    fn from(result: Result<Value, FetchError>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

// == Content Client ==
/// Client for the content API.
#[derive(Debug, Clone)]
pub struct ContentClient {
    base_url: Url,
    fetcher: CachingFetcher,
    default_options: RequestOptions,
}

impl ContentClient {
    /// Creates a client for the API rooted at `base_url`
    /// (e.g. `http://localhost:3000/api`).
    pub fn new(base_url: &str, fetcher: CachingFetcher) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            fetcher,
            default_options: RequestOptions::json(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn cache(&self) -> &SharedCache {
        self.fetcher.cache()
    }

    // == Load ==
    /// Loads `request`, answering from the cache when possible.
    pub async fn load(&self, request: &ContentRequest) -> Result<Value, FetchError> {
        let url = request.url(&self.base_url);
        self.fetcher
            .fetch(url.as_str(), &request.cache_key(), &self.default_options)
            .await
    }

    pub async fn reviews_summary(&self, limit: Option<u32>) -> Result<Value, FetchError> {
        self.load(&ContentRequest::ReviewsSummary { limit }).await
    }

    pub async fn category_reviews(&self, category: &str) -> Result<Value, FetchError> {
        self.load(&ContentRequest::CategoryReviews {
            category: category.to_string(),
        })
        .await
    }

    pub async fn review(&self, id: &str) -> Result<Value, FetchError> {
        self.load(&ContentRequest::Review { id: id.to_string() }).await
    }

    pub async fn all_reviews(&self) -> Result<Value, FetchError> {
        self.load(&ContentRequest::AllReviews).await
    }

    pub async fn news(&self, limit: Option<u32>) -> Result<Value, FetchError> {
        self.load(&ContentRequest::News { limit }).await
    }

    pub async fn news_summary(&self, limit: Option<u32>) -> Result<Value, FetchError> {
        self.load(&ContentRequest::NewsSummary { limit }).await
    }

    pub async fn news_article(&self, id: &str) -> Result<Value, FetchError> {
        self.load(&ContentRequest::NewsArticle { id: id.to_string() }).await
    }

    pub async fn images(&self) -> Result<Value, FetchError> {
        self.load(&ContentRequest::Images).await
    }

    pub async fn search(&self, query: &str, scope: SearchScope) -> Result<Value, FetchError> {
        self.load(&ContentRequest::Search {
            query: query.to_string(),
            scope,
        })
        .await
    }

    /// Video listings change too often to cache; always hits the network.
    pub async fn youtube_videos(&self, category: Option<&str>) -> Result<Value, FetchError> {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("youtube");
        }
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("category", category);
        }
        self.fetcher
            .fetch_uncached(url.as_str(), &self.default_options)
            .await
    }

    // == Api Call ==
    /// Cached call to an arbitrary endpoint. Absolute URLs are used as given,
    /// anything else is appended to the base URL.
    pub async fn api_call(
        &self,
        endpoint: &str,
        cache_key: &str,
        options: &RequestOptions,
    ) -> Result<Value, FetchError> {
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url.as_str().trim_end_matches('/'), endpoint)
        };
        let options = self.default_options.merged(options);
        self.fetcher.fetch(&url, cache_key, &options).await
    }

    // == Refresh ==
    /// Drops the cached response for `request` and loads it again.
    pub async fn refresh(&self, request: &ContentRequest) -> Result<Value, FetchError> {
        self.clear_cache(&request.cache_key()).await;
        self.load(request).await
    }

    // == Batch Load ==
    /// Loads every request concurrently. Failures are reported per label
    /// instead of failing the batch.
    pub async fn batch_load(
        &self,
        requests: Vec<(String, ContentRequest)>,
    ) -> BTreeMap<String, BatchResult> {
        let loads = requests.into_iter().map(|(label, request)| async move {
            let result = self.load(&request).await;
            (label, BatchResult::from(result))
        });
        join_all(loads).await.into_iter().collect()
    }

    /// Warms the cache with the data the landing pages need first.
    pub async fn preload_common_data(&self) {
        info!("Preloading common data...");
        let requests = [
            ContentRequest::ReviewsSummary { limit: Some(5) },
            ContentRequest::News { limit: Some(5) },
            ContentRequest::CategoryReviews {
                category: "luxury".to_string(),
            },
            ContentRequest::CategoryReviews {
                category: "performance".to_string(),
            },
        ];

        let results = join_all(requests.iter().map(|request| self.load(request))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed == 0 {
            info!("Common data preloaded");
        } else {
            warn!("Preload finished with {} of {} requests failing", failed, requests.len());
        }
    }

    // == Cache Helpers ==
    pub async fn clear_cache(&self, cache_key: &str) {
        let key = cache_key.to_string();
        blocking::write(self.cache(), move |cache| cache.remove(&key)).await;
        info!("Cleared API cache: {}", cache_key);
    }

    pub async fn clear_all_cache(&self) -> usize {
        blocking::write(self.cache(), |cache| cache.clear_all())
            .await
            .unwrap_or(0)
    }

    /// True if `cache_key` holds a fresh entry.
    pub async fn is_cached(&self, cache_key: &str) -> bool {
        let key = cache_key.to_string();
        blocking::write(self.cache(), move |cache| cache.contains(&key))
            .await
            .unwrap_or(false)
    }

    /// Age of the entry under `cache_key`, expired or not.
    pub async fn cache_age(&self, cache_key: &str) -> Option<Duration> {
        let key = cache_key.to_string();
        blocking::read(self.cache(), move |cache| cache.entry_age(&key))
            .await
            .flatten()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        blocking::read(self.cache(), |cache| cache.stats())
            .await
            .unwrap_or_default()
    }
}
