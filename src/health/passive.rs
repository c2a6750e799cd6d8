//! Passive health checking (forwarding outcomes).
//!
//! # Responsibilities
//! - Observe the outcome of every forwarded request
//! - Keep the consecutive-failure count current
//! - Take a backend out of rotation on the first transport failure
//!
//! # Design Decisions
//! - Only transport errors (refused, reset, timeout, protocol) are failures
//! - A response below 500 resets the failure count; a 5xx leaves it as is
//! - Recovery is left to the active monitor

use std::error::Error;

use axum::http::StatusCode;

use crate::load_balancer::backend::Backend;

/// Record a response received from `backend`.
pub fn observe_response(backend: &Backend, status: StatusCode) {
    if !status.is_server_error() {
        backend.reset_failure_count();
    }
}

/// Record a transport failure while forwarding to `backend`.
pub fn observe_transport_failure(backend: &Backend, error: &dyn Error) {
    let failures = backend.record_failure();
    let was_alive = backend.set_alive(false);
    tracing::warn!(
        backend = %backend.address(),
        failures,
        was_alive,
        error = %error,
        "Forward failed, backend marked down"
    );
}
