//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the pokedex server:
//! - HTTP request metrics (latency, counts, errors)
//! - Auth failures and rate-limit rejections
//! - Catalog readiness (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pokedex_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pokedex_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "pokedex_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pokedex_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

/// Requests rejected by the rate limiter.
pub static RATE_LIMITED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "pokedex_rate_limited_total",
        "Total requests rejected by the rate limiter",
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics (collected dynamically)
// =============================================================================

/// Whether the catalog index has been loaded (1) or not (0).
pub static CATALOG_INDEX_LOADED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "pokedex_catalog_index_loaded",
        "Whether the catalog index is loaded (1) or not (0)",
    )
    .unwrap()
});

/// Detail records held in the cache.
pub static CATALOG_CACHED_DETAILS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "pokedex_catalog_cached_details",
        "Number of detail records in the cache",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(RATE_LIMITED_TOTAL.clone()))
        .unwrap();

    // Catalog
    registry
        .register(Box::new(CATALOG_INDEX_LOADED.clone()))
        .unwrap();
    registry
        .register(Box::new(CATALOG_CACHED_DETAILS.clone()))
        .unwrap();

    // Core metrics (index, cache, upstream, hydration)
    for metric in pokedex_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.catalog().status().await;
    CATALOG_INDEX_LOADED.set(if status.index_loaded { 1 } else { 0 });
    CATALOG_CACHED_DETAILS.set(status.cached_details as i64);
}

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace numeric ids with a placeholder).
pub fn normalize_path(path: &str) -> String {
    NUMERIC_SEGMENT.replace_all(path, "/{id}$1").to_string()
}
