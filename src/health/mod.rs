//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Startup probe, then periodic timer
//!     → Probe each backend concurrently (bounded timeout)
//!     → 2xx/3xx: alive + response time; otherwise: not alive
//!
//! Passive health checks (passive.rs):
//!     Forwarded request outcome observed
//!     → Transport failure: not alive, failure count + 1
//!     → Response < 500: failure count reset
//! ```
//!
//! # Design Decisions
//! - Liveness is a single flag per backend; no intermediate states
//! - A single failed forward takes a backend out of rotation immediately
//! - Probe failures are isolated per backend and never reach request traffic

pub mod active;
pub mod passive;

pub use active::{HealthMonitor, ProbeOutcome};
