//! Types for the federated search engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shard::MediaRecord;

/// Offset value marking the end of a pagination walk.
pub const END_OF_RESULTS: u64 = 0;

/// Parameters for one federated search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query, or the exact name of a saved group.
    pub query: String,
    /// Optional exact-match media type narrowing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Maximum records per page.
    #[serde(default = "default_max_results")]
    pub max_results: u64,
    /// Records to skip in the merged ordering.
    #[serde(default)]
    pub offset: u64,
}

fn default_max_results() -> u64 {
    10
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            media_type: None,
            max_results: default_max_results(),
            offset: 0,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_max_results(mut self, max_results: u64) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

/// One page of merged search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    /// Matching records, primary shard block first, most recent insertion
    /// first within each shard.
    pub records: Vec<MediaRecord>,
    /// Offset for the next page, or `END_OF_RESULTS` (0) when the walk is
    /// done. Offset 0 is unambiguous: a non-terminal page always advances
    /// past it.
    pub next_offset: u64,
    /// Exact match count across both shards at query time.
    pub total: u64,
    /// True when one shard failed and the page holds single-shard results.
    #[serde(default)]
    pub partial: bool,
}

impl SearchPage {
    /// The empty terminal page.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            next_offset: END_OF_RESULTS,
            total: 0,
            partial: false,
        }
    }
}

/// Errors that escape a search call.
///
/// Pattern compilation failures never surface here; they fail closed into
/// an empty page.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Both shards unavailable")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let json = r#"{"query": "loki"}"#;
        let parsed: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.query, "loki");
        assert_eq!(parsed.max_results, 10);
        assert_eq!(parsed.offset, 0);
        assert!(parsed.media_type.is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("loki")
            .with_media_type("video")
            .with_max_results(25)
            .with_offset(50);
        assert_eq!(request.media_type.as_deref(), Some("video"));
        assert_eq!(request.max_results, 25);
        assert_eq!(request.offset, 50);
    }

    #[test]
    fn test_empty_page_is_terminal() {
        let page = SearchPage::empty();
        assert_eq!(page.next_offset, END_OF_RESULTS);
        assert!(page.records.is_empty());
        assert!(!page.partial);
    }
}
