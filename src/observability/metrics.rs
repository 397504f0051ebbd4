//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, served_by
//! - `proxy_request_duration_seconds` (histogram): edge latency
//! - `proxy_health_probes_total` (counter): probes by backend, verdict
//!
//! # Design Decisions
//! - Recording is a no-op until the exporter is installed
//! - Labels identify provenance, never client identity

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::proxy::backend::BackendRole;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record one routed request.
pub fn record_request(method: &str, status: u16, served_by: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("served_by", served_by.to_string()),
    ];
    metrics::counter!("proxy_requests_total", &labels).increment(1);
    metrics::histogram!("proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a completed health probe.
pub fn record_probe(backend: BackendRole, healthy: bool) {
    let labels = [
        ("backend", backend.as_str().to_string()),
        ("healthy", healthy.to_string()),
    ];
    metrics::counter!("proxy_health_probes_total", &labels).increment(1);
}
