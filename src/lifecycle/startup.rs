//! Startup reporting.

use crate::config::BalancerConfig;

/// Log the effective configuration once the listener is bound.
pub fn log_banner(config: &BalancerConfig, local_addr: std::net::SocketAddr) {
    tracing::info!(
        address = %local_addr,
        strategy = config.strategy.display_name(),
        backends = config.backends.len(),
        "Load balancer starting"
    );
    for backend in &config.backends {
        tracing::info!(url = %backend.url, weight = backend.weight, "Backend configured");
    }
    if config.health_check.enabled {
        tracing::info!(
            interval_ms = config.health_check.interval_ms,
            timeout_ms = config.health_check.timeout_ms,
            path = %config.health_check.path,
            "Health checks enabled"
        );
    } else {
        tracing::warn!("Health checks disabled; backends stay alive until a forward fails");
    }
}
