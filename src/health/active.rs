//! Active health checking.
//!
//! # Responsibilities
//! - Probe every backend once at startup, then on a fixed interval
//! - Probe backends concurrently, one probe per backend per tick
//! - Update backend liveness, response time and failure count

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::http::client::{build_client, HttpClient};
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;

const USER_AGENT: &str = concat!("edge-balancer-health-check/", env!("CARGO_PKG_VERSION"));

/// Result of probing one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Status in [200, 400).
    Healthy { status: StatusCode, latency: Duration },
    /// Status 400 or above.
    Unhealthy { status: StatusCode },
    /// Connection refused, reset, or the request could not be built.
    Unreachable { reason: String },
    /// No response within the probe timeout.
    TimedOut,
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy { .. })
    }
}

/// Issue one GET against `path` on `backend`, bounded by `timeout`.
pub async fn probe(
    client: &HttpClient,
    backend: &Backend,
    path: &str,
    timeout: Duration,
) -> ProbeOutcome {
    let request = backend.target_uri(path).and_then(|uri| {
        Request::get(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())
    });
    let request = match request {
        Ok(req) => req,
        Err(e) => {
            return ProbeOutcome::Unreachable {
                reason: e.to_string(),
            }
        }
    };

    let start = Instant::now();
    match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            let status = response.status();
            if (200..400).contains(&status.as_u16()) {
                ProbeOutcome::Healthy {
                    status,
                    latency: start.elapsed(),
                }
            } else {
                ProbeOutcome::Unhealthy { status }
            }
        }
        Ok(Err(e)) => ProbeOutcome::Unreachable {
            reason: e.to_string(),
        },
        Err(_) => ProbeOutcome::TimedOut,
    }
}

/// Apply a probe outcome to the backend's state.
pub fn apply_outcome(backend: &Backend, outcome: &ProbeOutcome) {
    backend.mark_checked(SystemTime::now());

    match outcome {
        ProbeOutcome::Healthy { latency, .. } => {
            backend.update_response_time(*latency);
            backend.reset_failure_count();
            if !backend.set_alive(true) {
                tracing::info!(backend = %backend.address(), latency = ?latency, "Backend is back up");
            } else {
                tracing::debug!(backend = %backend.address(), latency = ?latency, "Backend healthy");
            }
        }
        failed => {
            let failures = backend.record_failure();
            let was_alive = backend.set_alive(false);
            match failed {
                ProbeOutcome::Unhealthy { status } => {
                    tracing::warn!(backend = %backend.address(), status = %status, failures, was_alive, "Health check failed: non-success status");
                }
                ProbeOutcome::Unreachable { reason } => {
                    tracing::warn!(backend = %backend.address(), error = %reason, failures, was_alive, "Health check failed: connection error");
                }
                _ => {
                    tracing::warn!(backend = %backend.address(), failures, was_alive, "Health check failed: timeout");
                }
            }
        }
    }

    metrics::record_backend_health(backend.address(), backend.is_alive());
}

/// Background prober for every backend in the pool.
pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: HttpClient,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        let client = build_client(config.timeout());
        Self {
            pool,
            config,
            client,
        }
    }

    /// Probe immediately, then every interval until `shutdown` fires.
    ///
    /// Shutdown stops further ticks; a round already in flight runs to
    /// completion (each probe is bounded by the probe timeout).
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval_ms = self.config.interval_ms,
            timeout_ms = self.config.timeout_ms,
            path = %self.config.path,
            backends = self.pool.len(),
            "Health monitor starting"
        );

        self.check_all().await;

        let interval = self.config.interval();
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend concurrently and wait for the round to finish.
    pub async fn check_all(&self) {
        let mut probes = JoinSet::new();

        for backend in self.pool.backends().iter().cloned() {
            let client = self.client.clone();
            let path = self.config.path.clone();
            let timeout = self.config.timeout();
            probes.spawn(async move {
                let outcome = probe(&client, &backend, &path, timeout).await;
                apply_outcome(&backend, &outcome);
            });
        }

        while let Some(joined) = probes.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Health probe task failed");
            }
        }
    }
}
