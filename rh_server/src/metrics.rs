//! Prometheus metrics for the booking engine.
//!
//! Metrics are exposed in Prometheus text format on a separate listener. Without
//! an installed recorder every call here is a no-op.
//!
//! # Metrics
//!
//! - `http_requests_total`, `http_request_duration_ms`
//! - `booking_transitions_total` by target status and outcome
//! - `vehicle_reservation_conflicts_total`
//! - `ledger_postings_total` by entry kind
//! - `refund_steps_total` by refund status

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Errors
///
/// Returns a message if the exporter cannot be installed.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Booking Metrics
// ============================================================================

/// Record a transition attempt. `outcome` is `ok` or the error kind.
pub fn booking_transition(target: &str, outcome: &str) {
    metrics::counter!("booking_transitions_total",
        "target" => target.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// A reservation lost to another booking on the same vehicle.
pub fn reservation_conflict() {
    metrics::counter!("vehicle_reservation_conflicts_total").increment(1);
}

// ============================================================================
// Ledger Metrics
// ============================================================================

pub fn ledger_posting(kind: &str) {
    metrics::counter!("ledger_postings_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

pub fn refund_step(status: &str) {
    metrics::counter!("refund_steps_total",
        "status" => status.to_string()
    )
    .increment(1);
}
