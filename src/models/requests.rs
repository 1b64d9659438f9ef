//! Request DTOs for the sidecar API
//!
//! Single content loads take a bare `ContentRequest` body; only batches need
//! a wrapper.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::client::ContentRequest;

/// Maximum number of requests accepted in one batch
pub const MAX_BATCH_SIZE: usize = 32;

/// Request body for POST /content/batch
///
/// Maps a caller-chosen label to each request; results come back under the
/// same labels.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub requests: BTreeMap<String, ContentRequest>,
}

impl BatchRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.requests.is_empty() {
            return Some("Batch cannot be empty".to_string());
        }
        if self.requests.len() > MAX_BATCH_SIZE {
            return Some(format!(
                "Batch exceeds maximum size of {} requests",
                MAX_BATCH_SIZE
            ));
        }
        self.requests
            .iter()
            .find_map(|(label, request)| request.validate().map(|e| format!("{}: {}", label, e)))
    }

    pub fn into_labeled(self) -> Vec<(String, ContentRequest)> {
        self.requests.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_request_deserialize() {
        let json = r#"{"requests": {
            "hero": {"kind": "reviews_summary", "limit": 5},
            "gallery": {"kind": "images"}
        }}"#;
        let req: BatchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.requests.len(), 2);
        assert_eq!(req.requests["gallery"], ContentRequest::Images);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_batch() {
        let req = BatchRequest {
            requests: BTreeMap::new(),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_names_bad_label() {
        let mut requests = BTreeMap::new();
        requests.insert("story".to_string(), ContentRequest::NewsArticle { id: "".to_string() });
        let error = BatchRequest { requests }.validate().unwrap();
        assert!(error.starts_with("story:"), "got {}", error);
    }

    #[test]
    fn test_validate_oversized_batch() {
        let requests = (0..=MAX_BATCH_SIZE)
            .map(|i| (format!("r{}", i), ContentRequest::Review { id: i.to_string() }))
            .collect();
        assert!(BatchRequest { requests }.validate().is_some());
    }
}
