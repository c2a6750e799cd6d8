//! Load balancer error types.

use thiserror::Error;

/// Errors raised while building or administering the backend registry.
#[derive(Debug, Error)]
pub enum LoadBalancerError {
    /// No backend addresses were configured.
    #[error("no backend addresses provided")]
    NoBackends,

    /// A backend address could not be parsed or uses an unsupported scheme.
    #[error("invalid backend address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The same address was registered twice.
    #[error("backend '{0}' is registered more than once")]
    DuplicateBackend(String),

    /// Strategy name not recognised.
    #[error("unknown strategy '{0}' (expected roundrobin, leastconnections, random, weighted or iphash)")]
    UnknownStrategy(String),

    /// No backend registered under this address.
    #[error("backend '{0}' not found")]
    BackendNotFound(String),
}

/// Result type for load balancer operations.
pub type LoadBalancerResult<T> = Result<T, LoadBalancerError>;

/// Errors produced while forwarding a request to a backend.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Connection refused, reset, protocol error or connect timeout.
    #[error("upstream transport failure: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// No response headers arrived within the forward timeout.
    #[error("upstream did not respond within {0:?}")]
    Timeout(std::time::Duration),

    /// The outbound request could not be built.
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}
