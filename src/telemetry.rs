//! Telemetry for Yellows
//!
//! Prometheus counters exposed on /metrics. The interesting signal is
//! authentication: how many gate checks are denied and why, and how
//! many logins complete.

use crate::{Result, YellowsError};
use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, TextEncoder, register_counter_vec,
    register_histogram_vec,
};

/// Denied gate checks, labeled by internal denial reason
static AUTH_DENIED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "yellows_auth_denied_total",
        "Total number of denied authentication checks",
        &["reason"]
    )
    .unwrap()
});

/// Completed login flows, labeled ok/denied
static LOGINS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "yellows_logins_total",
        "Total number of completed login flows",
        &["outcome"]
    )
    .unwrap()
});

/// HTTP request duration histogram
static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        HistogramOpts::new(
            "yellows_http_request_duration_seconds",
            "Duration of HTTP requests in seconds"
        ),
        &["handler", "method"]
    )
    .unwrap()
});

/// Record a denied gate check
pub fn record_denied(reason: &str) {
    AUTH_DENIED_TOTAL.with_label_values(&[reason]).inc();
}

/// Record a completed login flow
pub fn record_login(outcome: &str) {
    LOGINS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a handled request's duration
pub fn observe_request(handler: &str, method: &str, seconds: f64) {
    HTTP_REQUEST_DURATION
        .with_label_values(&[handler, method])
        .observe(seconds);
}

/// Render all registered metrics in Prometheus text format
pub fn get_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| YellowsError::config(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| YellowsError::config(format!("Metrics are not valid UTF-8: {}", e)))
}
