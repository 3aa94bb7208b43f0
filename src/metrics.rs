//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("stillfeed_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");

    // Feed Metrics
    pub static ref FEED_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("stillfeed_feed_queries_total", "Total number of feed queries"),
        &["feed"]
    ).expect("metric can be created");
    pub static ref FEED_ASSEMBLY_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "stillfeed_feed_assembly_duration_seconds",
            "Feed page assembly duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["feed"]
    ).expect("metric can be created");

    // Engagement Metrics
    pub static ref ENGAGEMENT_EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("stillfeed_engagement_events_total", "Total number of tracked engagement events"),
        &["kind"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("stillfeed_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    // Registration fails only on duplicate registration; tests that build
    // multiple servers in one process share the lazy registry, so ignore it.
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(FEED_QUERIES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(FEED_ASSEMBLY_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ENGAGEMENT_EVENTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));

    tracing::info!("Metrics registry initialized");
}
