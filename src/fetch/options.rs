//! Per-request options for the fetcher.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;

/// HTTP method and headers applied to a network request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
        }
    }
}

impl RequestOptions {
    /// GET with `Content-Type: application/json`, the content API default.
    pub fn json() -> Self {
        Self::default().with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Layers `overrides` on top of `self`: its method wins and its headers
    /// replace same-named ones.
    pub fn merged(&self, overrides: &RequestOptions) -> Self {
        let mut headers = self.headers.clone();
        for (name, value) in &overrides.headers {
            headers.insert(name.clone(), value.clone());
        }
        Self {
            method: overrides.method.clone(),
            headers,
        }
    }
}
