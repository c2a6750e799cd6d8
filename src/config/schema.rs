//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for (de)serialization from TOML or JSON files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::load_balancer::StrategyKind;

/// Backends used when neither a config file nor the command line names any.
pub const DEFAULT_BACKENDS: [&str; 3] = [
    "http://localhost:8081",
    "http://localhost:8082",
    "http://localhost:8083",
];

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BalancerConfig {
    /// Selection strategy.
    pub strategy: StrategyKind,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend server definitions, in rotation order.
    pub backends: Vec<BackendConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl BalancerConfig {
    /// Default configuration pointing at the three local demo backends.
    pub fn with_default_backends() -> Self {
        Self {
            backends: DEFAULT_BACKENDS
                .iter()
                .map(|url| BackendConfig::new(*url))
                .collect(),
            ..Self::default()
        }
    }

    /// Use the local demo backends when none are configured.
    ///
    /// Returns true when the fallback was applied, so callers can report it.
    pub fn fill_default_backends(&mut self) -> bool {
        if !self.backends.is_empty() {
            return false;
        }
        self.backends = Self::with_default_backends().backends;
        true
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BackendConfig {
    /// Backend address (e.g., "http://127.0.0.1:3000" or "127.0.0.1:3000").
    #[serde(alias = "address")]
    pub url: String,

    /// Weight for weighted round robin (default: 1, 0 disables).
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            weight: default_weight(),
        }
    }

    pub fn weighted(url: impl Into<String>, weight: u32) -> Self {
        Self {
            url: url.into(),
            weight,
        }
    }
}

fn default_weight() -> u32 {
    1
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in milliseconds.
    pub interval_ms: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path to probe on each backend.
    pub path: String,
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 10_000,
            timeout_ms: 5_000,
            path: "/health".to_string(),
        }
    }
}

/// Timeout configuration for forwarded requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    /// Upper bound on waiting for a backend's response headers.
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 5_000,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable text or JSON lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin API under `/admin`.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: BalancerConfig = toml::from_str(
            r#"
            strategy = "leastconnections"

            [[backends]]
            url = "http://127.0.0.1:3000"

            [[backends]]
            address = "127.0.0.1:3001"
            weight = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy, StrategyKind::LeastConnections);
        assert_eq!(config.backends[0].weight, 1);
        assert_eq!(config.backends[1], BackendConfig::weighted("127.0.0.1:3001", 3));
        assert_eq!(config.health_check, HealthCheckConfig::default());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_json_config() {
        let config: BalancerConfig = serde_json::from_str(
            r#"{
                "backends": [{"url": "http://localhost:8081", "weight": 2}],
                "strategy": "weighted",
                "health_check": {"interval_ms": 2000, "path": "/ping"},
                "observability": {"log_format": "json"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.strategy, StrategyKind::Weighted);
        assert_eq!(config.health_check.interval(), Duration::from_secs(2));
        assert_eq!(config.health_check.timeout(), Duration::from_secs(5));
        assert_eq!(config.health_check.path, "/ping");
        assert_eq!(config.timeouts.request(), Duration::from_secs(30));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_default_backends() {
        let config = BalancerConfig::with_default_backends();
        assert_eq!(config.backends.len(), 3);
        assert!(BalancerConfig::default().backends.is_empty());
    }

    #[test]
    fn test_fill_default_backends_only_when_empty() {
        let mut empty = BalancerConfig::default();
        assert!(empty.fill_default_backends());
        assert_eq!(empty.backends.len(), DEFAULT_BACKENDS.len());

        let mut configured = BalancerConfig::default();
        configured.backends.push(BackendConfig::new("http://10.0.0.1:80"));
        assert!(!configured.fill_default_backends());
        assert_eq!(configured.backends, vec![BackendConfig::new("http://10.0.0.1:80")]);
    }
}
