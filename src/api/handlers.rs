//! API Handlers
//!
//! HTTP request handlers for each sidecar endpoint.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{blocking, PersistentCache, SharedCache};
use crate::client::{BatchResult, ContentClient, ContentRequest};
use crate::config::Config;
use crate::error::{ApiError, FetchError, Result};
use crate::fetch::CachingFetcher;
use crate::models::{
    BatchRequest, ClearResponse, DeleteResponse, GetResponse, HealthResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The client reads and writes through the same `SharedCache` the cache
/// endpoints inspect.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe persistent cache
    pub cache: SharedCache,
    /// Content API client backed by `cache`
    pub client: ContentClient,
}

impl AppState {
    /// Creates a new AppState serving `api_base_url` through `cache`.
    pub fn new(cache: SharedCache, api_base_url: &str) -> std::result::Result<Self, FetchError> {
        let client = ContentClient::new(api_base_url, CachingFetcher::new(cache.clone()))?;
        Ok(Self { cache, client })
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the on-disk store and runs the startup expiry pass before the
    /// cache is shared.
    pub fn from_config(config: &Config) -> std::result::Result<Self, FetchError> {
        let mut cache = PersistentCache::new(config.file_storage(), config.cache_config());
        cache.init();
        Self::new(cache.into_shared(), &config.api_base_url)
    }
}

/// Handler for GET /cache/:key
///
/// Returns the cached payload. Expired and corrupt entries are removed and
/// reported as not found.
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: a lookup may delete the entry
    let lookup_key = key.clone();
    let value = blocking::write(&state.cache, move |cache| cache.get(&lookup_key))
        .await
        .flatten();

    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:key
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.client.clear_cache(&key).await;
    Json(DeleteResponse::new(key))
}

/// Handler for DELETE /cache
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.client.clear_all_cache().await;
    Json(ClearResponse::all(removed))
}

/// Handler for POST /cache/clear-expired
pub async fn clear_expired_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = blocking::write(&state.cache, |cache| cache.clear_expired())
        .await
        .unwrap_or(0);
    Json(ClearResponse::expired(removed))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.client.cache_stats().await;
    Json(StatsResponse::new(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for POST /content
///
/// Loads one content request, from the cache when possible.
pub async fn content_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = body?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let payload = state.client.load(&req).await?;
    Ok(Json(payload))
}

/// Handler for POST /content/refresh
///
/// Drops the cached response and loads it again from the API.
pub async fn refresh_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = body?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let payload = state.client.refresh(&req).await?;
    Ok(Json(payload))
}

/// Handler for POST /content/batch
///
/// Individual failures are reported per label; the batch itself succeeds.
pub async fn batch_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BTreeMap<String, BatchResult>>> {
    let Json(req) = body?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let results = state.client.batch_load(req.into_labeled()).await;
    Ok(Json(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    // Nothing listens on the discard port
    const OFFLINE_API: &str = "http://127.0.0.1:9/api";

    fn create_state() -> AppState {
        let cache = PersistentCache::new(MemoryStorage::new(), CacheConfig::default());
        AppState::new(cache.into_shared(), OFFLINE_API).unwrap()
    }

    #[tokio::test]
    async fn test_get_entry_handler() {
        let state = create_state();
        state.cache.write().await.set("images", json!(["a.jpg"]));

        let response = get_entry_handler(State(state), Path("images".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!(["a.jpg"]));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = create_state();

        let result = get_entry_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_entry_handler() {
        let state = create_state();
        state.cache.write().await.set("to_delete", json!(1));

        delete_entry_handler(State(state.clone()), Path("to_delete".to_string())).await;

        let result = get_entry_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clear_all_handler() {
        let state = create_state();
        state.cache.write().await.set("a", json!(1));
        state.cache.write().await.set("b", json!(2));

        let response = clear_all_handler(State(state.clone())).await;
        assert_eq!(response.removed, 2);
        assert!(state.cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = create_state();
        state.cache.write().await.set("a", json!(1));

        let response = stats_handler(State(state)).await;
        assert_eq!(response.stats.total_items, 1);
        assert_eq!(response.hit_rate, 0.0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_content_handler_served_from_cache() {
        let state = create_state();
        state.cache.write().await.set("review_7", json!({"id": 7}));

        let response = content_handler(
            State(state),
            Ok(Json(ContentRequest::Review { id: "7".to_string() })),
        )
        .await
        .unwrap();
        assert_eq!(response.0, json!({"id": 7}));
    }

    #[tokio::test]
    async fn test_content_handler_invalid_request() {
        let state = create_state();

        let result = content_handler(
            State(state),
            Ok(Json(ContentRequest::CategoryReviews { category: " ".to_string() })),
        )
        .await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_content_handler_upstream_failure() {
        let state = create_state();

        let result = content_handler(State(state), Ok(Json(ContentRequest::AllReviews))).await;
        assert!(matches!(result, Err(ApiError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_refresh_handler_drops_stale_copy_on_failure() {
        let state = create_state();
        state.cache.write().await.set("images", json!(["old.jpg"]));

        let result = refresh_handler(State(state.clone()), Ok(Json(ContentRequest::Images))).await;
        assert!(result.is_err());
        assert!(!state.cache.write().await.contains("images"));
    }
}
