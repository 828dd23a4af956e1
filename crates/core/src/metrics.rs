//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Matching (library/catalog match outcomes, enrichment batches)
//! - Download routing (submissions by protocol)
//! - Seeded torrent reclamation (sweep outcomes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Matching Metrics
// =============================================================================

/// Library match attempts by outcome.
pub static LIBRARY_MATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookhound_library_matches_total",
            "Total library match attempts",
        ),
        &["stage"], // "identifier", "fuzzy", "none"
    )
    .unwrap()
});

/// Catalog items enriched per batch.
pub static ENRICHMENT_BATCH_SIZE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bookhound_enrichment_batch_size",
            "Number of catalog items enriched per call",
        )
        .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Download Routing Metrics
// =============================================================================

/// Release submissions by protocol and result.
pub static SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookhound_submissions_total", "Total release submissions"),
        &["protocol", "result"], // protocol: "torrent", "usenet"; result: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Reclaim Metrics
// =============================================================================

/// Reclaim sweeps run.
pub static RECLAIM_SWEEPS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("bookhound_reclaim_sweeps_total", "Total reclaim sweeps").unwrap()
});

/// Torrents/requests cleaned up by reclaim sweeps.
pub static RECLAIM_CLEANED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "bookhound_reclaim_cleaned_total",
        "Total rows cleaned by reclaim sweeps",
    )
    .unwrap()
});

/// Rows skipped by reclaim sweeps, by reason.
pub static RECLAIM_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookhound_reclaim_skipped_total",
            "Total rows skipped by reclaim sweeps",
        ),
        &["reason"], // "below_threshold", "shared", "client_error", "no_policy"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(LIBRARY_MATCHES.clone()),
        Box::new(ENRICHMENT_BATCH_SIZE.clone()),
        Box::new(SUBMISSIONS.clone()),
        Box::new(RECLAIM_SWEEPS.clone()),
        Box::new(RECLAIM_CLEANED.clone()),
        Box::new(RECLAIM_SKIPPED.clone()),
    ]
}
