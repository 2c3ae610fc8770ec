//! Prometheus metrics for the ticket pipeline.
//!
//! Collectors are created lazily and registered by the server.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts};

// =============================================================================
// Engine
// =============================================================================

/// Ticket requests by outcome.
pub static TICKET_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("referboard_ticket_requests_total", "Total ticket requests"),
        &["outcome"], // "cached", "refreshed", "failed"
    )
    .unwrap()
});

/// Full pipeline duration in seconds.
pub static PIPELINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "referboard_pipeline_duration_seconds",
            "Duration of fetch, reconcile and aggregate",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Sources
// =============================================================================

/// Source fetch failures by source.
pub static SOURCE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "referboard_source_failures_total",
            "Total failed fetches per ticket source",
        ),
        &["source"],
    )
    .unwrap()
});

/// Tickets returned by each source on the last refresh.
pub static SOURCE_TICKETS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "referboard_source_tickets",
            "Tickets returned by each source on the last refresh",
        ),
        &["source"],
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKET_REQUESTS.clone()),
        Box::new(PIPELINE_DURATION.clone()),
        Box::new(SOURCE_FAILURES.clone()),
        Box::new(SOURCE_TICKETS.clone()),
    ]
}
