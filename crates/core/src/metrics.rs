//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Index (size)
//! - Detail cache (hits, misses)
//! - Upstream calls (requests, retries, fallbacks)
//! - Hydration (page duration, dropped items)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Index
// =============================================================================

/// Entries in the currently published index snapshot.
pub static INDEX_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("pokedex_index_size", "Entries in the published catalog index").unwrap()
});

/// Index load attempts by result.
pub static INDEX_LOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pokedex_index_loads_total", "Total catalog index load attempts"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Detail cache
// =============================================================================

/// Detail cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pokedex_cache_lookups_total", "Total detail cache lookups"),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// Upstream
// =============================================================================

/// Upstream calls by operation and outcome.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pokedex_upstream_requests_total", "Total upstream catalog calls"),
        &["operation", "outcome"], // operation: "list", "by_id", "by_url"
    )
    .unwrap()
});

/// Retries of transient upstream failures.
pub static UPSTREAM_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("pokedex_upstream_retries_total", "Total upstream retries").unwrap()
});

/// Fallback fetches through the listing URL by result.
pub static FALLBACK_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pokedex_fallback_attempts_total", "Total fallback fetches by URL"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Hydration
// =============================================================================

/// Items left out of a hydrated page after every path failed.
pub static HYDRATION_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "pokedex_hydration_dropped_total",
        "Total items dropped from hydrated pages",
    )
    .unwrap()
});

/// Time to hydrate one page.
pub static HYDRATION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "pokedex_hydration_duration_seconds",
            "Duration of page hydration",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one upstream call outcome.
pub fn record_upstream<T, E: std::fmt::Display>(operation: &str, result: &Result<T, E>) {
    let outcome = if result.is_ok() { "success" } else { "failure" };
    UPSTREAM_REQUESTS
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Index
        Box::new(INDEX_SIZE.clone()),
        Box::new(INDEX_LOADS.clone()),
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        // Upstream
        Box::new(UPSTREAM_REQUESTS.clone()),
        Box::new(UPSTREAM_RETRIES.clone()),
        Box::new(FALLBACK_ATTEMPTS.clone()),
        // Hydration
        Box::new(HYDRATION_DROPPED.clone()),
        Box::new(HYDRATION_DURATION.clone()),
    ]
}
