//! Router-owned request counters and read-only snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, UNIX_EPOCH};

use serde::Serialize;

use crate::load_balancer::Backend;

/// Request counters written on every request.
#[derive(Debug)]
pub struct RequestStats {
    total: AtomicU64,
    failed: AtomicU64,
    started: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// `(total, failed)`. Failures are read first, so `failed <= total`.
    pub fn counts(&self) -> (u64, u64) {
        let failed = self.failed.load(Ordering::SeqCst);
        let total = self.total.load(Ordering::SeqCst);
        (total, failed)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Success rate as a percentage rounded to two decimals; `None` before any request.
pub fn success_rate(total: u64, failed: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let succeeded = total.saturating_sub(failed) as f64;
    let rate = succeeded / total as f64 * 100.0;
    Some((rate * 100.0).round() / 100.0)
}

/// Point-in-time view of one backend.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackendSnapshot {
    pub url: String,
    pub weight: u32,
    pub alive: bool,
    pub connections: usize,
    pub response_time_ms: f64,
    pub fail_count: u32,
    /// Unix millis of the last health probe.
    pub last_check_ms: Option<u64>,
}

impl From<&Backend> for BackendSnapshot {
    fn from(backend: &Backend) -> Self {
        Self {
            url: backend.address().to_string(),
            weight: backend.weight(),
            alive: backend.is_alive(),
            connections: backend.connections(),
            response_time_ms: backend.response_time().as_secs_f64() * 1_000.0,
            fail_count: backend.fail_count(),
            last_check_ms: backend
                .last_check()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64),
        }
    }
}

/// Aggregate metrics consumed by the stats and admin surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct RouterSnapshot {
    pub strategy: String,
    pub total_requests: u64,
    pub failed_requests: u64,
    /// Percentage, two decimals. Absent before the first request.
    pub success_rate: Option<f64>,
    pub uptime_secs: u64,
    pub total_backends: usize,
    pub alive_backends: usize,
    pub backends: Vec<BackendSnapshot>,
}

impl RouterSnapshot {
    /// `"83.33%"`, or `"N/A"` before the first request.
    pub fn success_rate_label(&self) -> String {
        match self.success_rate {
            Some(rate) => format!("{:.2}%", rate),
            None => "N/A".to_string(),
        }
    }
}
