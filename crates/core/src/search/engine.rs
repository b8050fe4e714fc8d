//! Federated search across the two shards.
//!
//! A query runs against both shards and merges into one paginated result.
//! Execution is exact-count: both shards are counted concurrently, then
//! both finds run concurrently with the secondary's skip derived from the
//! primary's count. The merged ordering is always the primary block first
//! (most recent insertion first), then the secondary block, so walking
//! `next_offset` from 0 visits every match exactly once.

use std::sync::Arc;
use std::time::Instant;

use futures::future;
use tracing::{debug, warn};

use crate::groups::GroupStore;
use crate::metrics;
use crate::shard::{MediaFilter, MediaRecord, Shard, ShardError};

use super::pattern::build_match_pattern;
use super::types::{SearchError, SearchPage, SearchRequest, END_OF_RESULTS};

/// Federated search engine over the two shards and the saved groups.
pub struct FederatedSearch {
    primary: Arc<dyn Shard>,
    secondary: Arc<dyn Shard>,
    groups: Arc<dyn GroupStore>,
    use_caption_filter: bool,
}

impl FederatedSearch {
    pub fn new(
        primary: Arc<dyn Shard>,
        secondary: Arc<dyn Shard>,
        groups: Arc<dyn GroupStore>,
        use_caption_filter: bool,
    ) -> Self {
        Self {
            primary,
            secondary,
            groups,
            use_caption_filter,
        }
    }

    /// Execute one search call.
    ///
    /// A query equal to a saved group name returns the group's members in
    /// membership order, bypassing the regex path. Otherwise both shards
    /// are queried concurrently and merged. One failed shard degrades the
    /// page to single-shard results with `partial` set; both failing is an
    /// error. A pattern that does not compile yields an empty page.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        let start = Instant::now();
        let query = request.query.trim();

        match self.groups.get(query) {
            Ok(Some(group)) => {
                let page = self.search_group(&group.member_ids, request).await?;
                metrics::SEARCH_DURATION
                    .with_label_values(&["group"])
                    .observe(start.elapsed().as_secs_f64());
                metrics::SEARCH_RESULTS
                    .with_label_values(&[])
                    .observe(page.records.len() as f64);
                return Ok(page);
            }
            Ok(None) => {}
            Err(e) => {
                // A broken group store must not take regex search down
                warn!(error = %e, "Group lookup failed, falling back to pattern search");
            }
        }

        let Some(pattern) = build_match_pattern(query) else {
            warn!(query, "Query pattern did not compile, returning empty page");
            metrics::SEARCH_DURATION
                .with_label_values(&["empty"])
                .observe(start.elapsed().as_secs_f64());
            return Ok(SearchPage::empty());
        };

        let mut filter = MediaFilter::new(pattern.as_str());
        if let Some(ref media_type) = request.media_type {
            filter = filter.with_media_type(media_type.clone());
        }
        if !self.use_caption_filter {
            filter = filter.name_only();
        }

        let page = self.search_pattern(&filter, request).await?;
        debug!(
            query,
            returned = page.records.len(),
            total = page.total,
            partial = page.partial,
            "Search complete"
        );
        metrics::SEARCH_DURATION
            .with_label_values(&["regex"])
            .observe(start.elapsed().as_secs_f64());
        metrics::SEARCH_RESULTS
            .with_label_values(&[])
            .observe(page.records.len() as f64);
        Ok(page)
    }

    /// Point lookup by compact id, primary shard first.
    pub async fn get(&self, compact_id: &str) -> Result<Option<MediaRecord>, ShardError> {
        match self.primary.get(compact_id).await {
            Ok(Some(record)) => return Ok(Some(record)),
            Ok(None) => {}
            Err(e) => {
                warn!(shard = %self.primary.name(), error = %e, "Point lookup failed, trying secondary");
            }
        }
        self.secondary.get(compact_id).await
    }

    /// Resolve a saved group: slice the membership list, fetch the sliced
    /// ids from both shards, and restore membership order.
    async fn search_group(
        &self,
        member_ids: &[String],
        request: &SearchRequest,
    ) -> Result<SearchPage, SearchError> {
        let total = member_ids.len() as u64;
        let from = (request.offset as usize).min(member_ids.len());
        let to = (from + request.max_results as usize).min(member_ids.len());
        let slice = &member_ids[from..to];

        if slice.is_empty() {
            return Ok(SearchPage {
                records: Vec::new(),
                next_offset: END_OF_RESULTS,
                total,
                partial: false,
            });
        }

        let slice_vec = slice.to_vec();
        let (primary_found, secondary_found) = future::join(
            self.primary.find_by_ids(&slice_vec),
            self.secondary.find_by_ids(&slice_vec),
        )
        .await;

        let mut failed_shards = 0;
        let mut found: Vec<MediaRecord> = Vec::with_capacity(slice.len());
        for (shard_name, result) in [
            (self.primary.name(), primary_found),
            (self.secondary.name(), secondary_found),
        ] {
            match result {
                Ok(mut records) => found.append(&mut records),
                Err(e) => {
                    warn!(shard = %shard_name, error = %e, "Group member fetch failed");
                    metrics::SEARCH_PARTIAL
                        .with_label_values(&[&shard_name.to_string()])
                        .inc();
                    failed_shards += 1;
                }
            }
        }
        if failed_shards == 2 {
            return Err(SearchError::Unavailable);
        }
        let partial = failed_shards > 0;

        // Membership order, not shard order
        let records: Vec<MediaRecord> = slice
            .iter()
            .filter_map(|id| found.iter().find(|r| &r.compact_id == id).cloned())
            .collect();

        let next_offset = request.offset + slice.len() as u64;
        let next_offset = if next_offset >= total {
            END_OF_RESULTS
        } else {
            next_offset
        };

        Ok(SearchPage {
            records,
            next_offset,
            total,
            partial,
        })
    }

    /// Exact-count federated pattern search.
    async fn search_pattern(
        &self,
        filter: &MediaFilter,
        request: &SearchRequest,
    ) -> Result<SearchPage, SearchError> {
        let (primary_count, secondary_count) =
            future::join(self.primary.count(filter), self.secondary.count(filter)).await;

        let primary_count = self.unwrap_shard_count(&self.primary, primary_count);
        let secondary_count = self.unwrap_shard_count(&self.secondary, secondary_count);
        if primary_count.is_none() && secondary_count.is_none() {
            return Err(SearchError::Unavailable);
        }

        let offset = request.offset;
        let limit = request.max_results;

        // The merged ordering is the primary block followed by the
        // secondary block, so the primary's count tells us where a global
        // offset lands in the secondary.
        let c1 = primary_count.unwrap_or(0);
        let take1 = match primary_count {
            Some(c) => c.saturating_sub(offset).min(limit),
            None => 0,
        };
        let skip2 = offset.saturating_sub(c1);
        let take2 = match secondary_count {
            Some(c) => c.saturating_sub(skip2).min(limit - take1),
            None => 0,
        };

        let find1 = async {
            if take1 > 0 {
                self.primary.find(filter, offset, take1).await
            } else {
                Ok(Vec::new())
            }
        };
        let find2 = async {
            if take2 > 0 {
                self.secondary.find(filter, skip2, take2).await
            } else {
                Ok(Vec::new())
            }
        };
        let (primary_found, secondary_found) = future::join(find1, find2).await;

        let mut partial = primary_count.is_none() || secondary_count.is_none();
        let mut any_delivered = false;
        let mut total = 0u64;
        let mut records = Vec::with_capacity((take1 + take2) as usize);

        // A shard that failed either round contributes nothing, including
        // its count, so the page stays self-consistent.
        for (shard_name, count, found) in [
            (self.primary.name(), primary_count, primary_found),
            (self.secondary.name(), secondary_count, secondary_found),
        ] {
            match (count, found) {
                (Some(count), Ok(mut shard_records)) => {
                    any_delivered = true;
                    total += count;
                    records.append(&mut shard_records);
                }
                (Some(_), Err(e)) => {
                    warn!(shard = %shard_name, error = %e, "Shard find failed");
                    metrics::SEARCH_PARTIAL
                        .with_label_values(&[&shard_name.to_string()])
                        .inc();
                    partial = true;
                }
                (None, _) => {}
            }
        }
        if !any_delivered {
            return Err(SearchError::Unavailable);
        }

        let next_offset = offset + records.len() as u64;
        let next_offset = if records.is_empty() || next_offset >= total {
            END_OF_RESULTS
        } else {
            next_offset
        };

        Ok(SearchPage {
            records,
            next_offset,
            total,
            partial,
        })
    }

    fn unwrap_shard_count(
        &self,
        shard: &Arc<dyn Shard>,
        result: Result<u64, ShardError>,
    ) -> Option<u64> {
        match result {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(shard = %shard.name(), error = %e, "Shard count failed");
                metrics::SEARCH_PARTIAL
                    .with_label_values(&[&shard.name().to_string()])
                    .inc();
                None
            }
        }
    }
}
