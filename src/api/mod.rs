//! API Module
//!
//! HTTP handlers and routing for the cache sidecar.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `GET /cache/:key` - Read a cached payload
//! - `DELETE /cache/:key` - Remove one entry
//! - `DELETE /cache` - Remove every entry
//! - `POST /cache/clear-expired` - Remove expired entries
//! - `POST /content` - Load content through the cache
//! - `POST /content/refresh` - Reload content, bypassing the cache
//! - `POST /content/batch` - Load several requests at once

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
