//! Prometheus metrics for observability.
//!
//! HTTP request metrics and scrape-time engine gauges live here; pipeline and
//! source metrics come from `referboard_core::metrics` and are registered
//! alongside them.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::error;

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
            "referboard_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("referboard_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "referboard_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics (collected dynamically)
// =============================================================================

/// Age of the served snapshot; -1 before the first successful refresh.
pub static SNAPSHOT_AGE_SECONDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "referboard_snapshot_age_seconds",
        "Seconds since the last successful refresh (-1 if none)",
    )
    .unwrap()
});

/// Whether the primary source has credentials (1) or not (0).
pub static PRIMARY_CONFIGURED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "referboard_primary_configured",
        "Whether the primary ticket source is configured",
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

    // Engine
    registry
        .register(Box::new(SNAPSHOT_AGE_SECONDS.clone()))
        .unwrap();
    registry
        .register(Box::new(PRIMARY_CONFIGURED.clone()))
        .unwrap();

    // Core metrics (engine, sources)
    for metric in referboard_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh gauges that mirror engine state. Called right before encoding.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let engine = state.engine();
    PRIMARY_CONFIGURED.set(i64::from(engine.is_configured()));
    let age = engine
        .cache_age_secs()
        .await
        .map(|secs| i64::try_from(secs).unwrap_or(i64::MAX))
        .unwrap_or(-1);
    SNAPSHOT_AGE_SECONDS.set(age);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("referboard_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs vectors that have at least one child
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        referboard_core::metrics::TICKET_REQUESTS
            .with_label_values(&["cached"])
            .inc();
        referboard_core::metrics::SOURCE_TICKETS
            .with_label_values(&["eventbrite"])
            .set(0);

        let output = encode_metrics();

        assert!(output.contains("referboard_http_request_duration_seconds"));
        assert!(output.contains("referboard_http_requests_in_flight"));
        assert!(output.contains("referboard_ticket_requests_total"));
        assert!(output.contains("referboard_source_tickets"));
    }
}
