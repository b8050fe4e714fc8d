//! Shard size monitoring with a TTL'd cache.
//!
//! Routing decisions need the primary shard's footprint on every ingest,
//! but measuring it is a real query. The monitor caches the last
//! measurement and reuses it while it is fresh *and* still below the
//! migration threshold; a cached value at or past the threshold forces a
//! refresh so a shard that just crossed the line is noticed promptly
//! instead of after a full TTL window.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::metrics;
use crate::shard::Shard;

/// One cached measurement.
#[derive(Debug, Clone, Copy)]
struct SizeCache {
    measured_at: Instant,
    size_bytes: u64,
}

/// Measures and caches a shard's storage footprint.
///
/// The cache is read-then-possibly-refreshed without holding a lock across
/// the store call; a redundant refresh under concurrent ingest is
/// acceptable, write correctness rests on the store's uniqueness
/// constraint.
pub struct SizeMonitor {
    ttl: Duration,
    threshold_bytes: u64,
    cache: Mutex<Option<SizeCache>>,
}

impl SizeMonitor {
    pub fn new(ttl: Duration, threshold_bytes: u64) -> Self {
        Self {
            ttl,
            threshold_bytes,
            cache: Mutex::new(None),
        }
    }

    /// The configured migration threshold in bytes.
    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_bytes
    }

    /// Current footprint of `shard` in bytes.
    ///
    /// Returns the cached value when it is younger than the TTL and below
    /// the threshold. On a failed size query, returns 0 (unknown, assume
    /// small) and leaves the cache untouched.
    pub async fn measure(&self, shard: &dyn Shard) -> u64 {
        if let Some(cached) = *self.cache.lock().unwrap() {
            if cached.measured_at.elapsed() < self.ttl && cached.size_bytes < self.threshold_bytes
            {
                return cached.size_bytes;
            }
        }

        match shard.stats().await {
            Ok(stats) => {
                let size_bytes = stats.total_bytes();
                debug!(shard = %shard.name(), size_bytes, "Refreshed shard size");
                metrics::SIZE_CACHE_REFRESHES.with_label_values(&["ok"]).inc();
                *self.cache.lock().unwrap() = Some(SizeCache {
                    measured_at: Instant::now(),
                    size_bytes,
                });
                size_bytes
            }
            Err(e) => {
                warn!(shard = %shard.name(), error = %e, "Shard size query failed");
                metrics::SIZE_CACHE_REFRESHES
                    .with_label_values(&["error"])
                    .inc();
                0
            }
        }
    }
}
