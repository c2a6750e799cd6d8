//! Request orchestration.
//!
//! # Responsibilities
//! - Count every request and every failed request
//! - Ask the active strategy for a backend
//! - Delegate forwarding to the backend and map failures to HTTP responses
//! - Allow the strategy to be swapped and liveness to be overridden at runtime

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::BalancerConfig;
use crate::http::client::{build_client, HttpClient};
use crate::load_balancer::{
    Backend, BackendPool, LoadBalancerResult, SelectionContext, Strategy,
};
use crate::observability::metrics;
use crate::routing::snapshot::{success_rate, BackendSnapshot, RequestStats, RouterSnapshot};

/// Forward timeout used when none is configured.
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

/// Entry point for proxied traffic.
pub struct Router {
    pool: Arc<BackendPool>,
    strategy: ArcSwap<Box<dyn Strategy>>,
    client: HttpClient,
    forward_timeout: Duration,
    stats: RequestStats,
}

impl Router {
    pub fn new(pool: Arc<BackendPool>, strategy: Box<dyn Strategy>, client: HttpClient) -> Self {
        Self {
            pool,
            strategy: ArcSwap::from_pointee(strategy),
            client,
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
            stats: RequestStats::new(),
        }
    }

    /// Bound the wait for a backend's response headers.
    pub fn with_forward_timeout(mut self, timeout: Duration) -> Self {
        self.forward_timeout = timeout;
        self
    }

    /// Build pool, strategy and upstream client from configuration.
    pub fn from_config(config: &BalancerConfig) -> LoadBalancerResult<Self> {
        let pool = BackendPool::from_config(&config.backends)?;
        let client = build_client(config.timeouts.connect());
        Ok(Self::new(Arc::new(pool), config.strategy.build(), client)
            .with_forward_timeout(config.timeouts.request()))
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    pub fn forward_timeout(&self) -> Duration {
        self.forward_timeout
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.load().name()
    }

    /// Select a backend with the strategy active at the time of the call.
    pub fn select(&self, ctx: &SelectionContext) -> Option<Arc<Backend>> {
        let strategy = self.strategy.load_full();
        strategy.select(self.pool.backends(), ctx)
    }

    /// Route one request. Always produces an HTTP response.
    pub async fn handle(&self, request: Request<Body>, ctx: &SelectionContext) -> Response {
        self.stats.record_request();

        let Some(backend) = self.select(ctx) else {
            self.stats.record_failure();
            metrics::record_no_backend();
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "No available backends"
            );
            return (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response();
        };

        tracing::debug!(
            backend = %backend.address(),
            connections = backend.connections(),
            method = %request.method(),
            path = %request.uri().path(),
            "Forwarding request"
        );

        match backend.forward(&self.client, request, self.forward_timeout).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_failure();
                tracing::error!(backend = %backend.address(), error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
        }
    }

    /// Replace the active strategy. Selections already holding the old one finish with it.
    pub fn set_strategy(&self, strategy: Box<dyn Strategy>) {
        let previous = self.strategy.swap(Arc::new(strategy));
        tracing::info!(
            from = previous.name(),
            to = self.strategy_name(),
            "Strategy changed"
        );
    }

    /// Override the liveness of the backend registered under `address`.
    pub fn mark_backend(&self, address: &str, alive: bool) -> LoadBalancerResult<Arc<Backend>> {
        self.pool.mark_backend_status(address, alive)
    }

    /// Read-only aggregate view; never mutates any counter.
    pub fn snapshot(&self) -> RouterSnapshot {
        let (total, failed) = self.stats.counts();
        let backends: Vec<BackendSnapshot> = self
            .pool
            .backends()
            .iter()
            .map(|b| BackendSnapshot::from(b.as_ref()))
            .collect();
        let alive_backends = backends.iter().filter(|b| b.alive).count();

        RouterSnapshot {
            strategy: self.strategy_name().to_string(),
            total_requests: total,
            failed_requests: failed,
            success_rate: success_rate(total, failed),
            uptime_secs: self.stats.uptime().as_secs(),
            total_backends: backends.len(),
            alive_backends,
            backends,
        }
    }
}
