//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define balancer metrics (requests, latency, backend health)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-backend metrics
//!
//! # Metrics
//! - `lb_requests_total` (counter): forwarded requests by backend, status
//! - `lb_request_duration_seconds` (histogram): upstream latency by backend
//! - `lb_no_backend_total` (counter): requests rejected with no live backend
//! - `lb_backend_up` (gauge): 1=healthy, 0=unhealthy
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Record the outcome of a forwarded request.
pub fn record_forward(backend: &str, status: u16, elapsed: Duration) {
    counter!(
        "lb_requests_total",
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("lb_request_duration_seconds", "backend" => backend.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record a request rejected because no backend was available.
pub fn record_no_backend() {
    counter!("lb_no_backend_total").increment(1);
}

/// Publish the liveness of a backend after a probe.
pub fn record_backend_health(backend: &str, alive: bool) {
    gauge!("lb_backend_up", "backend" => backend.to_string()).set(if alive { 1.0 } else { 0.0 });
}
