//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): requests by method, status, backend
//! - `balancer_request_duration_seconds` (histogram): end-to-end latency
//! - `balancer_retries_total` (counter): retried forwarding attempts by backend
//! - `balancer_backend_alive` (gauge): 1=alive, 0=dead
//!
//! Recording is a no-op until an exporter is installed.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("backend", backend.to_string()),
    ];
    counter!("balancer_requests_total", &labels).increment(1);
    histogram!("balancer_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_retry(backend: &str) {
    counter!("balancer_retries_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_backend_alive(backend: &str, alive: bool) {
    gauge!("balancer_backend_alive", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}
