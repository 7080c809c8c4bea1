//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): forwarded requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): end-to-end forwarding latency
//! - `gateway_instance_health` (gauge): 1=healthy, 0=unhealthy, per service and url
//! - `gateway_probe_failures_total` (counter): failed health probes per service
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape listener. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, service: &str, started: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("service", service.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(started.elapsed().as_secs_f64());
}

pub fn record_instance_health(service: &str, url: &str, healthy: bool) {
    gauge!(
        "gateway_instance_health",
        "service" => service.to_string(),
        "url" => url.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_probe_failure(service: &str) {
    counter!("gateway_probe_failures_total", "service" => service.to_string()).increment(1);
}
