//! Command-line and environment overrides layered over a loaded config.

use crate::config::schema::{BackendConfig, BalancerConfig};
use crate::load_balancer::StrategyKind;

/// Values supplied on the command line (or through `EDGE_LB_*` variables).
///
/// Every field is optional; only the ones present replace config values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub backends: Option<String>,
    pub strategy: Option<StrategyKind>,
    pub health_interval_ms: Option<u64>,
    pub health_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut BalancerConfig) {
        if let Some(port) = self.port {
            config.listener.bind_address = with_port(&config.listener.bind_address, port);
        }
        if let Some(list) = &self.backends {
            config.backends = parse_backend_list(list);
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(interval) = self.health_interval_ms {
            config.health_check.interval_ms = interval;
        }
        if let Some(timeout) = self.health_timeout_ms {
            config.health_check.timeout_ms = timeout;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

/// Split a comma-separated address list, dropping empty entries.
pub fn parse_backend_list(list: &str) -> Vec<BackendConfig> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(BackendConfig::new)
        .collect()
}

fn with_port(bind_address: &str, port: u16) -> String {
    let host = bind_address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .filter(|host| !host.is_empty())
        .unwrap_or("0.0.0.0");
    format!("{}:{}", host, port)
}
