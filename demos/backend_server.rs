//! Minimal backend for trying the balancer locally.
//!
//! ```text
//! cargo run --example backend-server -- 8081
//! ```

use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u16>())
        .transpose()?
        .unwrap_or(8081);

    tracing_subscriber::fmt().init();

    let app = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .fallback(move || async move { format!("Hello from backend on port {}\n", port) });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Backend listening");
    axum::serve(listener, app).await?;
    Ok(())
}
