//! Error types for the fetch layer and the sidecar API
//!
//! Storage errors live in `storage` and never leave the cache; the errors here
//! are the ones callers are expected to handle.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Fetch Error ==
/// Failure to obtain a payload from the network. Never answered from cache.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure: DNS, refused connection, reset, transport timeout
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered outside 200-299
    #[error("HTTP {status} from {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The body was not valid JSON
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Upstream HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            FetchError::Network(e) => e.status(),
            _ => None,
        }
    }
}

// == Api Error ==
/// Errors returned by the sidecar's HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The content API could not be reached or answered with an error
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] FetchError),
}

/// Malformed or mistyped JSON bodies are reported like any other bad request.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the sidecar handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
