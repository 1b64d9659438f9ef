//! Fetch Module
//!
//! Cache-first retrieval of JSON resources over HTTP.

mod fetcher;
mod options;

pub use fetcher::CachingFetcher;
pub use options::RequestOptions;
