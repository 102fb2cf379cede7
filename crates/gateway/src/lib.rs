//! HTTP API gateway for windlass.
//!
//! Exposes the workflow over REST and SSE: collected answers, streamed
//! answers, a progress-event log, and a liveness probe.
//!
//! Built on Axum.

pub mod api_v1;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use windlass_config::{AppConfig, GatewayConfig};

pub use api_v1::{ApiState, SharedApiState};

/// Build the full router with the v1 API nested under `/v1`.
///
/// Layers applied:
/// - Permissive CORS (browser clients consume the SSE endpoints directly)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server and serve until shutdown.
///
/// Builds the reasoner and tool registry from configuration once and
/// shares them across all requests.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    ensure_bind_allowed(&config.gateway)?;
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let reasoner = windlass_providers::build_from_config(&config);
    let registry = Arc::new(windlass_tools::default_registry(&config.tools));
    let state = ApiState::new(&config, reasoner, registry);

    let app = build_router(state);
    info!(addr = %addr, "Gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Refuse non-loopback binds unless explicitly opted in.
fn ensure_bind_allowed(gateway: &GatewayConfig) -> Result<(), String> {
    let loopback = matches!(gateway.host.as_str(), "127.0.0.1" | "::1" | "localhost");
    if !loopback && !gateway.allow_public_bind {
        return Err(format!(
            "Refusing to bind to {}: set gateway.allow_public_bind = true to expose the gateway",
            gateway.host
        ));
    }
    Ok(())
}
