//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy, stats and admin handlers
//! - Wire up middleware (request timeout, tracing)
//! - Spawn the health monitor alongside the listener
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::config::BalancerConfig;
use crate::health::HealthMonitor;
use crate::http::stats::{health_handler, stats_handler};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{LoadBalancerResult, SelectionContext};
use crate::routing::Router as BalancerRouter;

/// Slack between the forward timeout and the server-wide request timeout, so
/// a hung backend is reported as a gateway failure rather than cut off.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(1);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<BalancerRouter>,
    pub api_key: Arc<str>,
}

/// HTTP front end of the load balancer.
pub struct HttpServer {
    app: Router,
    config: BalancerConfig,
    router: Arc<BalancerRouter>,
}

impl HttpServer {
    /// Build the routing engine and HTTP application from `config`.
    pub fn new(config: BalancerConfig) -> LoadBalancerResult<Self> {
        let router = Arc::new(BalancerRouter::from_config(&config)?);

        let state = AppState {
            router: router.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };

        let app = Self::build_app(&config, state);
        Ok(Self {
            app,
            config,
            router,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &BalancerConfig, state: AppState) -> Router {
        let mut app = Router::new()
            .route("/stats", get(stats_handler))
            .route("/health", get(health_handler))
            .fallback(proxy_handler)
            .with_state(state.clone());

        if config.admin.enabled {
            app = app.merge(admin::setup_admin_router(state));
        }

        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(
                    config.timeouts.request() + REQUEST_TIMEOUT_SLACK,
                )),
        )
    }

    /// Run the server on `listener` until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            strategy = self.router.strategy_name(),
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(self.router.pool().clone(), self.config.health_check.clone());
        let monitor_shutdown = shutdown.subscribe();
        let monitor_task = tokio::spawn(async move {
            monitor.run(monitor_shutdown).await;
        });

        let mut server_shutdown = shutdown.subscribe();
        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Err(e) = monitor_task.await {
            tracing::error!(error = %e, "Health monitor task ended abnormally");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn router(&self) -> &Arc<BalancerRouter> {
        &self.router
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }
}

/// Proxy handler: selects a backend for the client and forwards the request.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let ctx = SelectionContext::from_client(client);
    state.router.handle(request, &ctx).await
}
