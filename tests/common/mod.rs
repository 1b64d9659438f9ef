//! Shared test helpers: a local content API stand-in and cache builders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use motor_cache::cache::{CacheConfig, ManualClock, PersistentCache, SharedCache};
use motor_cache::storage::MemoryStorage;

/// Fixed start time for tests driven by a `ManualClock`.
pub const T0: u64 = 1_700_000_000_000;

// == Mock Origin ==
/// Content API stand-in bound to an ephemeral local port.
///
/// Unknown paths answer with an echo of the request, so tests can check which
/// URL was called. Every request is recorded.
pub struct MockOrigin {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

type Requests = Arc<Mutex<Vec<String>>>;

impl MockOrigin {
    pub async fn start() -> Self {
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/api/status/:code", get(status))
            .route("/api/reviews/broken", get(broken))
            .route("/api/not-json", get(not_json))
            .route("/api/slow", get(slow))
            .route("/api/headers", get(headers))
            .fallback(echo)
            .with_state(requests.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    /// Base URL of the API, e.g. `http://127.0.0.1:40123/api`.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Absolute URL for `path` under the API base.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Number of requests received so far.
    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Path and query of every request received, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockOrigin {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn record(requests: &Requests, uri: &Uri) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    requests.lock().unwrap().push(target);
}

async fn echo(State(requests): State<Requests>, method: Method, uri: Uri) -> Json<Value> {
    record(&requests, &uri);
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
    }))
}

async fn status(
    State(requests): State<Requests>,
    Path(code): Path<u16>,
    uri: Uri,
) -> impl IntoResponse {
    record(&requests, &uri);
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": "mock failure" })))
}

async fn broken(State(requests): State<Requests>, uri: Uri) -> impl IntoResponse {
    record(&requests, &uri);
    (StatusCode::INTERNAL_SERVER_ERROR, "database offline")
}

async fn not_json(State(requests): State<Requests>, uri: Uri) -> impl IntoResponse {
    record(&requests, &uri);
    "<html>maintenance</html>"
}

async fn slow(State(requests): State<Requests>, uri: Uri) -> Json<Value> {
    record(&requests, &uri);
    tokio::time::sleep(Duration::from_millis(100)).await;
    Json(json!({ "reviews": [{ "id": 1, "title": "GT3 RS" }] }))
}

async fn headers(State(requests): State<Requests>, uri: Uri, headers: HeaderMap) -> Json<Value> {
    record(&requests, &uri);
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "content-type": header("content-type"),
        "x-client": header("x-client"),
    }))
}

// == Cache Builders ==

/// Cache over fresh in-memory storage driven by a manual clock.
pub fn manual_cache(config: CacheConfig) -> (SharedCache, MemoryStorage, ManualClock) {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let cache = PersistentCache::with_clock(storage.clone(), config, Arc::new(clock.clone()));
    (cache.into_shared(), storage, clock)
}

/// Address that refuses connections: bound once, then released.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}
