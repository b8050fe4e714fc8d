//! In-memory mock shard for testing.

use async_trait::async_trait;
use regex_lite::Regex;
use tokio::sync::RwLock;

use crate::shard::{
    InsertOutcome, MediaFilter, MediaRecord, Shard, ShardError, ShardName, ShardStats,
};

/// Mock implementation of the `Shard` trait.
///
/// Keeps records in insertion order (most recent last) so find/count behave
/// like a real shard's recency sort. Provides controllable behavior:
/// - configurable `stats()` so routing thresholds can be exercised
/// - failure injection for degraded-read and rejection paths
pub struct MockShard {
    name: ShardName,
    records: RwLock<Vec<MediaRecord>>,
    stats: RwLock<ShardStats>,
    failing: RwLock<bool>,
}

impl MockShard {
    pub fn new(name: ShardName) -> Self {
        Self {
            name,
            records: RwLock::new(Vec::new()),
            stats: RwLock::new(ShardStats::default()),
            failing: RwLock::new(false),
        }
    }

    /// Set the footprint reported by `stats()`.
    pub async fn set_stats(&self, stats: ShardStats) {
        *self.stats.write().await = stats;
    }

    /// When set, every shard call fails with a database error.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    /// Snapshot of stored records, oldest first.
    pub async fn records(&self) -> Vec<MediaRecord> {
        self.records.read().await.clone()
    }

    async fn check_failure(&self) -> Result<(), ShardError> {
        if *self.failing.read().await {
            Err(ShardError::Database("injected failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn matches(filter: &MediaFilter, regex: &Regex, record: &MediaRecord) -> bool {
        if let Some(ref media_type) = filter.media_type {
            if record.media_type.as_deref() != Some(media_type.as_str()) {
                return false;
            }
        }
        if regex.is_match(&record.name) {
            return true;
        }
        filter.match_caption
            && record
                .caption
                .as_deref()
                .map(|c| regex.is_match(c))
                .unwrap_or(false)
    }

    fn compile(filter: &MediaFilter) -> Result<Regex, ShardError> {
        Regex::new(&filter.pattern).map_err(|e| ShardError::Database(e.to_string()))
    }
}

#[async_trait]
impl Shard for MockShard {
    fn name(&self) -> ShardName {
        self.name
    }

    async fn exists(&self, compact_id: &str) -> Result<bool, ShardError> {
        self.check_failure().await?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .any(|r| r.compact_id == compact_id))
    }

    async fn insert(&self, record: MediaRecord) -> Result<InsertOutcome, ShardError> {
        self.check_failure().await?;
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.compact_id == record.compact_id) {
            return Ok(InsertOutcome::Duplicate);
        }
        records.push(record);
        Ok(InsertOutcome::Inserted)
    }

    async fn get(&self, compact_id: &str) -> Result<Option<MediaRecord>, ShardError> {
        self.check_failure().await?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.compact_id == compact_id)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<MediaRecord>, ShardError> {
        self.check_failure().await?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| ids.iter().any(|id| *id == r.compact_id))
            .cloned()
            .collect())
    }

    async fn find(
        &self,
        filter: &MediaFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<MediaRecord>, ShardError> {
        self.check_failure().await?;
        let regex = Self::compile(filter)?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| Self::matches(filter, &regex, r))
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &MediaFilter) -> Result<u64, ShardError> {
        self.check_failure().await?;
        let regex = Self::compile(filter)?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| Self::matches(filter, &regex, r))
            .count() as u64)
    }

    async fn stats(&self) -> Result<ShardStats, ShardError> {
        self.check_failure().await?;
        Ok(*self.stats.read().await)
    }
}
