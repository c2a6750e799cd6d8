//! Request routing engine.
//!
//! # Data Flow
//! ```text
//! HTTP request (+ client address)
//!     → router.rs: total += 1
//!     → active strategy selects a backend from the pool
//!         none  → failed += 1, 503
//!         some  → backend.forward()
//!                   ok  → upstream response returned verbatim
//!                   err → failed += 1, backend marked down, 502
//!     → snapshot.rs: counters + per-backend state on demand
//! ```
//!
//! # Design Decisions
//! - Strategy swap is a single atomic pointer store; no lock on the hot path
//! - Counters are plain atomics; snapshots are best-effort consistent

pub mod router;
pub mod snapshot;

pub use router::Router;
pub use snapshot::{BackendSnapshot, RouterSnapshot};
