//! Edge Balancer Library
//!
//! HTTP load balancer: a registry of backends, pluggable selection
//! strategies, active health probing and a forwarding router.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;

pub use config::schema::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Router;
