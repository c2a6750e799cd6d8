//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every backend address parses and is registered once
//! - Validate value ranges (interval/timeouts > 0, bind address valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::BalancerConfig;
use crate::load_balancer::Backend;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no backend addresses configured")]
    NoBackends,

    #[error("backend '{url}' is invalid: {reason}")]
    InvalidBackend { url: String, reason: String },

    #[error("backend '{0}' is listed more than once")]
    DuplicateBackend(String),

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("health check path must start with '/': '{0}'")]
    InvalidHealthPath(String),

    #[error("admin API is enabled but no api_key is set")]
    MissingAdminKey,
}

/// Validate `config`, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        match Backend::parse_address(&backend.url) {
            Ok(url) => {
                if !seen.insert(url.to_string()) {
                    errors.push(ValidationError::DuplicateBackend(backend.url.clone()));
                }
            }
            Err(e) => errors.push(ValidationError::InvalidBackend {
                url: backend.url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let health = &config.health_check;
    if health.enabled {
        if health.interval_ms == 0 {
            errors.push(ValidationError::ZeroDuration("health_check.interval_ms"));
        }
        if health.timeout_ms == 0 {
            errors.push(ValidationError::ZeroDuration("health_check.timeout_ms"));
        }
        if !health.path.starts_with('/') {
            errors.push(ValidationError::InvalidHealthPath(health.path.clone()));
        }
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.connect_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
