//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout + trace layers)
//!     → /stats, /health (stats.rs) | /admin/* (admin module)
//!     → everything else: routing::Router::handle
//!     → client.rs (hyper client to the chosen backend)
//!     → Response streamed back to client
//! ```

pub mod client;
pub mod server;
pub mod stats;

pub use client::{build_client, HttpClient};
pub use server::HttpServer;
