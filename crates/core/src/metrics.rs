//! Prometheus metrics for the search core.
//!
//! This module provides metrics for:
//! - Backend fan-out (per-backend outcome, latency, record counts)
//! - Merge and filter stages (result sizes, unresolved links)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Backend Metrics
// =============================================================================

/// Backend searches total by backend and result.
pub static BACKEND_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "torrsearch_backend_searches_total",
            "Total backend searches",
        ),
        &["backend", "result"], // "success", "error", "timeout", "panic"
    )
    .unwrap()
});

/// Backend search duration in seconds.
pub static BACKEND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "torrsearch_backend_duration_seconds",
            "Duration of a single backend search",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["backend"],
    )
    .unwrap()
});

/// Raw records returned by each backend.
pub static BACKEND_RECORDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "torrsearch_backend_records_total",
            "Total raw records returned by backends",
        ),
        &["backend"],
    )
    .unwrap()
});

// =============================================================================
// Merge / Filter Metrics
// =============================================================================

/// Records whose link did not resolve to an info hash.
pub static UNRESOLVED_RECORDS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "torrsearch_unresolved_records_total",
        "Records dropped or passed through because their link had no info hash",
    )
    .unwrap()
});

/// Results per search, by stage.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "torrsearch_search_results",
            "Number of results per search at each stage",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]),
        &["stage"], // "raw", "merged", "filtered"
    )
    .unwrap()
});

/// End-to-end search duration in seconds.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "torrsearch_search_duration_seconds",
            "Duration of a full fan-out, merge, filter and rank pass",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Backends
        Box::new(BACKEND_SEARCHES.clone()),
        Box::new(BACKEND_DURATION.clone()),
        Box::new(BACKEND_RECORDS.clone()),
        // Merge / filter
        Box::new(UNRESOLVED_RECORDS.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(SEARCH_DURATION.clone()),
    ]
}
