//! Client Module
//!
//! Typed requests against the Motor Nation content API, served through the
//! persistent cache.

mod content;
mod request;

pub use content::{BatchResult, ContentClient};
pub use request::{sanitize_query, ContentRequest, SearchScope};
