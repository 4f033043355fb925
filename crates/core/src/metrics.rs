//! Prometheus metrics for the search core.

use once_cell::sync::Lazy;
use prometheus::{core::Collector, HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Search units started, by source.
pub static UNITS_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dragnet_units_started_total", "Search units started"),
        &["source"],
    )
    .unwrap()
});

/// Search result pages fetched, by source.
pub static PAGES_FETCHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dragnet_pages_fetched_total", "Search pages fetched"),
        &["source"],
    )
    .unwrap()
});

/// Detail-page crawls performed, by source.
pub static CRAWLS_PERFORMED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dragnet_crawls_performed_total", "Detail crawls performed"),
        &["source"],
    )
    .unwrap()
});

/// Errors reported to session listeners, by source.
pub static SOURCE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dragnet_source_errors_total", "Source errors reported"),
        &["source"],
    )
    .unwrap()
});

/// DDOS/captcha block pages detected, by source.
pub static BLOCK_PAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dragnet_block_pages_total", "Block pages detected"),
        &["source"],
    )
    .unwrap()
});

/// Wall-clock run time of one search unit, by source.
pub static UNIT_RUN_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("dragnet_unit_run_seconds", "Search unit run time in seconds")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["source"],
    )
    .unwrap()
});

/// All core metrics, for registration in a server-side registry.
pub fn all_metrics() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(UNITS_STARTED.clone()),
        Box::new(PAGES_FETCHED.clone()),
        Box::new(CRAWLS_PERFORMED.clone()),
        Box::new(SOURCE_ERRORS.clone()),
        Box::new(BLOCK_PAGES.clone()),
        Box::new(UNIT_RUN_SECONDS.clone()),
    ]
}
