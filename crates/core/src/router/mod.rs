//! Write routing between the two shards.
//!
//! New records land in the primary shard until its measured footprint
//! reaches the migration threshold; from then on new writes go to the
//! secondary. Routing is one-directional and per-record permanent: once a
//! compact id is stored in a shard it never moves. Dedup rests on the
//! primary existence check plus each store's uniqueness constraint, not on
//! locking, so two concurrent ingests of the same item converge on one
//! stored record.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::codec::{self, CodecError};
use crate::metrics;
use crate::monitor::SizeMonitor;
use crate::shard::{InsertOutcome, MediaRecord, Shard, ShardError, ShardName};

/// A new media item as handed over by the provider layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Provider reference token wrapping the packed id fields.
    pub provider_token: String,
    /// Display/search name, sanitized before storage.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Result of a successful ingest call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Stored as a new record in `shard`.
    Inserted {
        shard: ShardName,
        compact_id: String,
    },
    /// A record with this compact id already exists; nothing was written.
    Duplicate { compact_id: String },
}

/// Rejections of an ingest call. `Duplicate` is not an error.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed provider reference: {0}")]
    MalformedReference(#[from] CodecError),

    #[error("Store error: {0}")]
    Store(#[from] ShardError),
}

/// Routes new records to the correct shard and performs dedup-safe
/// insertion.
pub struct WriteRouter {
    primary: Arc<dyn Shard>,
    secondary: Arc<dyn Shard>,
    monitor: Arc<SizeMonitor>,
}

impl WriteRouter {
    pub fn new(
        primary: Arc<dyn Shard>,
        secondary: Arc<dyn Shard>,
        monitor: Arc<SizeMonitor>,
    ) -> Self {
        Self {
            primary,
            secondary,
            monitor,
        }
    }

    /// Ingest one media item.
    ///
    /// Decode failure rejects the item before any store access. The
    /// primary always wins existence checks; the secondary is never
    /// consulted before routing, because under normal operation a record
    /// routed there cannot also exist in the primary.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome, IngestError> {
        let (compact_id, reference_token) =
            match codec::unpack_provider_token(&request.provider_token) {
                Ok(parts) => parts,
                Err(e) => {
                    warn!(name = %request.name, error = %e, "Rejected malformed provider reference");
                    metrics::INGEST_OUTCOMES
                        .with_label_values(&["malformed"])
                        .inc();
                    return Err(IngestError::MalformedReference(e));
                }
            };

        let exists = self
            .primary
            .exists(&compact_id)
            .await
            .map_err(|e| self.store_error(e))?;
        if exists {
            info!(%compact_id, name = %request.name, "Already saved in primary shard");
            metrics::INGEST_OUTCOMES
                .with_label_values(&["duplicate"])
                .inc();
            return Ok(IngestOutcome::Duplicate { compact_id });
        }

        let primary_size = self.monitor.measure(self.primary.as_ref()).await;
        let target = if primary_size >= self.monitor.threshold_bytes() {
            &self.secondary
        } else {
            &self.primary
        };
        let shard = target.name();

        let record = MediaRecord {
            compact_id: compact_id.clone(),
            reference_token,
            name: sanitize_name(&request.name),
            size_bytes: request.size_bytes,
            media_type: request.media_type,
            mime_type: request.mime_type,
            caption: request.caption,
        };

        match target
            .insert(record)
            .await
            .map_err(|e| self.store_error(e))?
        {
            InsertOutcome::Inserted => {
                info!(%compact_id, %shard, "Saved media record");
                let label = match shard {
                    ShardName::Primary => "inserted_primary",
                    ShardName::Secondary => "inserted_secondary",
                };
                metrics::INGEST_OUTCOMES.with_label_values(&[label]).inc();
                Ok(IngestOutcome::Inserted { shard, compact_id })
            }
            InsertOutcome::Duplicate => {
                // Lost the race against a concurrent ingest of the same item
                info!(%compact_id, %shard, "Already saved in target shard");
                metrics::INGEST_OUTCOMES
                    .with_label_values(&["duplicate"])
                    .inc();
                Ok(IngestOutcome::Duplicate { compact_id })
            }
        }
    }

    fn store_error(&self, e: ShardError) -> IngestError {
        metrics::INGEST_OUTCOMES
            .with_label_values(&["store_error"])
            .inc();
        IngestError::Store(e)
    }
}

static HANDLE_OR_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(https?://\S+|t\.me/\S+|@[A-Za-z0-9_]+)").expect("sanitizer pattern is valid")
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("pattern is valid"));

/// Strip promo handles and links from a display name and collapse the
/// whitespace they leave behind. Filename separators (dots, underscores)
/// are kept; search and episode extraction rely on them.
pub fn sanitize_name(name: &str) -> String {
    let stripped = HANDLE_OR_LINK.replace_all(name, " ");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}
