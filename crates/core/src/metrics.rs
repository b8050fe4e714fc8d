//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Write router (ingest outcomes)
//! - Federated search (duration, result counts, degraded reads)
//! - Size monitor (cache refreshes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

/// Ingest outcomes by result.
pub static INGEST_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediadex_ingest_outcomes_total", "Total ingest outcomes"),
        // "inserted_primary", "inserted_secondary", "duplicate",
        // "malformed", "store_error"
        &["result"],
    )
    .unwrap()
});

/// Search duration in seconds.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediadex_search_duration_seconds",
            "Duration of federated search calls",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        // "regex", "group", "empty"
        &["mode"],
    )
    .unwrap()
});

/// Records returned per search page.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediadex_search_results",
            "Number of records returned per search page",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &[],
    )
    .unwrap()
});

/// Searches that returned single-shard results because the other shard failed.
pub static SEARCH_PARTIAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediadex_search_partial_total",
            "Searches degraded to single-shard results",
        ),
        &["shard"], // the shard that failed
    )
    .unwrap()
});

/// Size cache refresh attempts by result.
pub static SIZE_CACHE_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediadex_size_cache_refreshes_total",
            "Shard size cache refresh attempts",
        ),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

/// Register all core metrics with a registry.
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(INGEST_OUTCOMES.clone()))?;
    registry.register(Box::new(SEARCH_DURATION.clone()))?;
    registry.register(Box::new(SEARCH_RESULTS.clone()))?;
    registry.register(Box::new(SEARCH_PARTIAL.clone()))?;
    registry.register(Box::new(SIZE_CACHE_REFRESHES.clone()))?;
    Ok(())
}
