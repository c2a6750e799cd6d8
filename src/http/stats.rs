//! Statistics and self-health endpoints.
//!
//! Both read the router snapshot only; neither mutates any counter.

use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::http::server::AppState;
use crate::routing::RouterSnapshot;

/// Render the plain-text statistics page.
pub fn render_stats(snapshot: &RouterSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Load Balancer Statistics");
    let _ = writeln!(out, "========================\n");
    let _ = writeln!(out, "Strategy: {}", snapshot.strategy);
    let _ = writeln!(out, "Total Backends: {}", snapshot.total_backends);
    let _ = writeln!(out, "Alive Backends: {}", snapshot.alive_backends);
    let _ = writeln!(out, "Total Requests: {}", snapshot.total_requests);
    let _ = writeln!(out, "Failed Requests: {}", snapshot.failed_requests);
    let _ = writeln!(out, "Success Rate: {}", snapshot.success_rate_label());
    let _ = writeln!(out, "Uptime: {}s\n", snapshot.uptime_secs);

    let _ = writeln!(out, "Backend Details:");
    let _ = writeln!(out, "----------------");
    for (i, backend) in snapshot.backends.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, backend.url);
        let status = if backend.alive { "✓ Alive" } else { "✗ Down" };
        let _ = writeln!(out, "   Status: {}", status);
        let _ = writeln!(out, "   Weight: {}", backend.weight);
        let _ = writeln!(out, "   Active Connections: {}", backend.connections);
        let _ = writeln!(out, "   Response Time: {:.3}ms", backend.response_time_ms);
        let _ = writeln!(out, "   Fail Count: {}\n", backend.fail_count);
    }
    out
}

pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_stats(&state.router.snapshot());
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

/// Liveness of the balancer process itself.
pub async fn health_handler() -> impl IntoResponse {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Json(json!({ "status": "healthy", "timestamp": timestamp }))
}
