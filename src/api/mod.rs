//! HTTP surface exposing the live system snapshot
//!
//! A single route, `GET /monitor`, returns the JSON snapshot assembled by
//! the monitor actor. Reads are pure observations; nothing on this surface
//! can write back into pipeline state.

pub mod error;
pub mod routes;

pub use error::{ApiError, ApiResult};

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::actors::monitor::MonitorHandle;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:9193")
    pub bind_addr: SocketAddr,
}

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Handle to the monitor actor assembling snapshots
    pub monitor: MonitorHandle,
}

/// Spawn the API server.
///
/// Starts an Axum HTTP server in a background task and returns the server's
/// local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = Router::new()
        .route("/monitor", get(routes::get_monitor))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
