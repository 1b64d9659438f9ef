//! Content API requests
//!
//! Each request knows its path under the API base URL and the cache key its
//! response is stored under.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Which content a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Reviews,
    News,
    #[default]
    All,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Reviews => "reviews",
            SearchScope::News => "news",
            SearchScope::All => "all",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Content Request ==
/// A cacheable read against the content API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentRequest {
    ReviewsSummary {
        #[serde(default)]
        limit: Option<u32>,
    },
    /// Reviews in one category (luxury, performance, ...)
    CategoryReviews { category: String },
    Review { id: String },
    AllReviews,
    News {
        #[serde(default)]
        limit: Option<u32>,
    },
    /// Latest articles, typically six
    NewsSummary {
        #[serde(default)]
        limit: Option<u32>,
    },
    NewsArticle { id: String },
    /// Gallery data
    Images,
    Search {
        query: String,
        #[serde(default)]
        scope: SearchScope,
    },
}

impl ContentRequest {
    // == Cache Key ==
    /// Logical cache key for this request's response.
    pub fn cache_key(&self) -> String {
        match self {
            ContentRequest::ReviewsSummary { limit } => {
                format!("reviews_summary_{}", limit_part(*limit))
            }
            ContentRequest::CategoryReviews { category } => format!("reviews_{}", category),
            ContentRequest::Review { id } => format!("review_{}", id),
            ContentRequest::AllReviews => "reviews_all".to_string(),
            ContentRequest::News { limit } => format!("news_{}", limit_part(*limit)),
            ContentRequest::NewsSummary { limit } => {
                format!("news_summary_{}", limit_part(*limit))
            }
            ContentRequest::NewsArticle { id } => format!("news_article_{}", id),
            ContentRequest::Images => "images".to_string(),
            ContentRequest::Search { query, scope } => {
                format!("search_{}_{}", scope, sanitize_query(query))
            }
        }
    }

    /// Path segments under the API base.
    fn segments(&self) -> Vec<&str> {
        match self {
            ContentRequest::ReviewsSummary { .. } => vec!["reviews", "summary"],
            ContentRequest::CategoryReviews { category } => vec!["reviews", category],
            ContentRequest::Review { id } => vec!["reviews", id],
            ContentRequest::AllReviews => vec!["reviews"],
            ContentRequest::News { .. } => vec!["news"],
            ContentRequest::NewsSummary { .. } => vec!["news", "summary"],
            ContentRequest::NewsArticle { id } => vec!["news", id],
            ContentRequest::Images => vec!["images"],
            ContentRequest::Search { .. } => vec!["search"],
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            ContentRequest::ReviewsSummary { limit }
            | ContentRequest::News { limit }
            | ContentRequest::NewsSummary { limit } => match limit {
                Some(n) if *n > 0 => vec![("limit", n.to_string())],
                _ => Vec::new(),
            },
            ContentRequest::Search { query, scope } => {
                vec![("q", query.clone()), ("type", scope.to_string())]
            }
            _ => Vec::new(),
        }
    }

    // == Url ==
    /// Full request URL under `base`. Path segments and query values are
    /// percent-encoded.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(self.segments());
        }
        let query = self.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    // == Validate ==
    /// Returns an error message if a required field is blank.
    pub fn validate(&self) -> Option<String> {
        let (field, value) = match self {
            ContentRequest::CategoryReviews { category } => ("category", category),
            ContentRequest::Review { id } | ContentRequest::NewsArticle { id } => ("id", id),
            ContentRequest::Search { query, .. } => ("query", query),
            _ => return None,
        };
        if value.trim().is_empty() {
            return Some(format!("{} cannot be empty", field));
        }
        None
    }
}

fn limit_part(limit: Option<u32>) -> String {
    match limit {
        Some(n) if n > 0 => n.to_string(),
        _ => "all".to_string(),
    }
}

/// Lowercases and replaces everything outside `[a-z0-9]` with `_`.
pub fn sanitize_query(query: &str) -> String {
    query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:3000/api").unwrap()
    }

    #[test]
    fn test_cache_keys() {
        let cases = [
            (ContentRequest::ReviewsSummary { limit: Some(5) }, "reviews_summary_5"),
            (ContentRequest::ReviewsSummary { limit: None }, "reviews_summary_all"),
            (
                ContentRequest::CategoryReviews { category: "luxury".into() },
                "reviews_luxury",
            ),
            (ContentRequest::Review { id: "17".into() }, "review_17"),
            (ContentRequest::AllReviews, "reviews_all"),
            (ContentRequest::News { limit: Some(5) }, "news_5"),
            (ContentRequest::NewsSummary { limit: None }, "news_summary_all"),
            (ContentRequest::NewsArticle { id: "3".into() }, "news_article_3"),
            (ContentRequest::Images, "images"),
        ];
        for (request, key) in cases {
            assert_eq!(request.cache_key(), key);
        }
    }

    #[test]
    fn test_article_keys_never_collide_with_news_lists() {
        let listing = ContentRequest::News { limit: Some(5) };
        let article = ContentRequest::NewsArticle { id: "5".into() };
        assert_ne!(listing.cache_key(), article.cache_key());

        let all = ContentRequest::News { limit: None };
        let article_all = ContentRequest::NewsArticle { id: "all".into() };
        assert_ne!(all.cache_key(), article_all.cache_key());
    }

    #[test]
    fn test_search_key_is_sanitized() {
        let request = ContentRequest::Search {
            query: "Porsche 911 GT3-RS!".into(),
            scope: SearchScope::Reviews,
        };
        assert_eq!(request.cache_key(), "search_reviews_porsche_911_gt3_rs_");
    }

    #[test]
    fn test_zero_limit_means_all() {
        let request = ContentRequest::News { limit: Some(0) };
        assert_eq!(request.cache_key(), "news_all");
        assert_eq!(request.url(&base()).as_str(), "http://localhost:3000/api/news");
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            ContentRequest::ReviewsSummary { limit: Some(5) }.url(&base()).as_str(),
            "http://localhost:3000/api/reviews/summary?limit=5"
        );
        assert_eq!(
            ContentRequest::AllReviews.url(&base()).as_str(),
            "http://localhost:3000/api/reviews"
        );
        assert_eq!(
            ContentRequest::NewsArticle { id: "12".into() }.url(&base()).as_str(),
            "http://localhost:3000/api/news/12"
        );
    }

    #[test]
    fn test_url_with_trailing_slash_base() {
        let base = Url::parse("https://example.com/api/").unwrap();
        assert_eq!(
            ContentRequest::Images.url(&base).as_str(),
            "https://example.com/api/images"
        );
    }

    #[test]
    fn test_url_encodes_user_input() {
        let request = ContentRequest::Search {
            query: "v8 & turbo".into(),
            scope: SearchScope::All,
        };
        let url = request.url(&base());
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "v8 & turbo".to_string()),
                ("type".to_string(), "all".to_string())
            ]
        );

        let review = ContentRequest::Review { id: "a/b".into() };
        assert_eq!(review.url(&base()).path(), "/api/reviews/a%2Fb");
    }

    #[test]
    fn test_validate() {
        assert!(ContentRequest::Images.validate().is_none());
        assert!(ContentRequest::Review { id: " ".into() }.validate().is_some());
        assert!(ContentRequest::Search { query: "".into(), scope: SearchScope::All }
            .validate()
            .is_some());
    }

    #[test]
    fn test_deserialize_tagged() {
        let request: ContentRequest =
            serde_json::from_str(r#"{"kind": "category_reviews", "category": "performance"}"#)
                .unwrap();
        assert_eq!(request, ContentRequest::CategoryReviews { category: "performance".into() });

        let request: ContentRequest = serde_json::from_str(r#"{"kind": "search", "query": "m3"}"#).unwrap();
        assert_eq!(request.cache_key(), "search_all_m3");

        let request: ContentRequest = serde_json::from_str(r#"{"kind": "all_reviews"}"#).unwrap();
        assert_eq!(request, ContentRequest::AllReviews);
    }
}
