//! Shard storage abstraction.
//!
//! The index runs on exactly two shards, `primary` and `secondary`, each an
//! independent store holding a disjoint set of records. The router and the
//! search engine only see this trait; which concrete store backs a shard is
//! wiring detail.

mod sqlite;
mod types;

pub use sqlite::SqliteShard;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from shard operations.
#[derive(Debug, Error)]
pub enum ShardError {
    #[error("Shard query failed: {0}")]
    Database(String),

    #[error("Internal shard error: {0}")]
    Internal(String),
}

/// A single backing store for media records.
///
/// Uniqueness of `compact_id` within a shard is the store's job; callers
/// rely on `insert` reporting `Duplicate` instead of failing so that
/// concurrent ingests of the same item converge without locking.
#[async_trait]
pub trait Shard: Send + Sync {
    /// Which shard this is, for logging and routing decisions.
    fn name(&self) -> ShardName;

    /// Whether a record with this id exists in the shard.
    async fn exists(&self, compact_id: &str) -> Result<bool, ShardError>;

    /// Insert a record; a uniqueness violation is a normal `Duplicate`
    /// outcome, not an error.
    async fn insert(&self, record: MediaRecord) -> Result<InsertOutcome, ShardError>;

    /// Point lookup by id.
    async fn get(&self, compact_id: &str) -> Result<Option<MediaRecord>, ShardError>;

    /// Fetch all records whose ids appear in `ids`, in unspecified order.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<MediaRecord>, ShardError>;

    /// Filtered find, most-recent-insertion-first, with skip/limit.
    async fn find(
        &self,
        filter: &MediaFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<MediaRecord>, ShardError>;

    /// Count of records matching the filter.
    async fn count(&self, filter: &MediaFilter) -> Result<u64, ShardError>;

    /// Current storage footprint.
    async fn stats(&self) -> Result<ShardStats, ShardError>;
}
