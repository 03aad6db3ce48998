// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use musing_core::MusingError;
use musing_engine::Engine;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Health state for the health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function. `None` disables `/metrics`.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Engine,
    /// Attach operator detail to 500 responses.
    pub debug_errors: bool,
    pub health: HealthState,
}

/// Gateway server configuration (mirrors `ServerConfig` from musing-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Builds the application router.
///
/// - GET /generate
/// - GET /history
/// - POST /translate
/// - GET, POST /visitors
/// - GET /health
/// - GET /metrics
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/generate", get(handlers::get_generate))
        .route("/history", get(handlers::get_history))
        .route("/translate", post(handlers::post_translate))
        .route(
            "/visitors",
            get(handlers::get_visitors).post(handlers::post_visitors),
        )
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds to the configured host:port and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), MusingError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MusingError::Server {
            message: format!("failed to bind to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| MusingError::Server {
            message: format!("server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("server stopped accepting connections");
    Ok(())
}
