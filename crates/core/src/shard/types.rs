//! Types for the shard storage layer.

use serde::{Deserialize, Serialize};

/// Which of the two backing stores a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardName {
    Primary,
    Secondary,
}

impl std::fmt::Display for ShardName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShardName::Primary => write!(f, "primary"),
            ShardName::Secondary => write!(f, "secondary"),
        }
    }
}

/// A single indexed media item.
///
/// `compact_id` is the codec-derived primary key; it is assigned once at
/// ingest and never regenerated. A record is owned by exactly one shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Stable dedup key, derived deterministically from the provider reference.
    pub compact_id: String,
    /// Opaque token used to re-fetch the underlying content.
    pub reference_token: String,
    /// Display and search field.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Coarse media type (e.g. "video", "document").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// MIME type as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Free-text caption, searchable alongside the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Outcome of an insert against a single shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The shard already holds a record with this `compact_id`.
    Duplicate,
}

/// Storage footprint of a shard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShardStats {
    pub data_bytes: u64,
    pub index_bytes: u64,
}

impl ShardStats {
    /// Combined footprint used for routing decisions.
    pub fn total_bytes(&self) -> u64 {
        self.data_bytes + self.index_bytes
    }
}

/// Typed filter for shard queries: a regex source matched against the name
/// (and optionally the caption), plus an optional exact media type.
///
/// Keeping the filter independent of the store's query representation lets
/// the search engine stay agnostic to what backs each shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    /// Regex source, already validated by the caller.
    pub pattern: String,
    /// Exact-match media type narrowing, if any.
    pub media_type: Option<String>,
    /// Whether the pattern also matches against captions.
    pub match_caption: bool,
}

impl MediaFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            media_type: None,
            match_caption: true,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn name_only(mut self) -> Self {
        self.match_caption = false;
        self
    }
}
