//! HTTP listener and top-level server wiring.
//!
//! This module:
//! - Builds the axum router:
//!   - `GET /ws/:client_id` upgrades to a WebSocket and hands it to
//!     the per-connection lifecycle in `client`,
//!   - `GET /` reports liveness and the number of live connections.
//! - Applies the permissive CORS policy and HTTP tracing.
//! - Binds the configured address and serves until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::client;
use crate::config::Config;
use crate::gateway::GeminiGateway;
use crate::types::{AppState, ClientId};

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub active_users: usize,
}

pub const STATUS_ONLINE: &str = "Aurora Engine Online";

/// Build the axum router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/ws/:client_id", get(ws_upgrade))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on an already-bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server terminated")
}

/// Run the relay with the given configuration.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    let gateway = GeminiGateway::new(&config.ai);
    if !gateway.has_api_key() {
        warn!("API_KEY not set, every ai_request will get the error reply");
    }

    let state = AppState::new(config, Arc::new(gateway));
    serve(listener, state).await
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: STATUS_ONLINE,
        active_users: state.active_connections().await,
    })
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    let current_clients = state.active_connections().await;
    if current_clients >= state.config.max_clients {
        warn!(
            client_id = %client_id,
            max_clients = state.config.max_clients,
            "rejecting connection, max_clients reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "max clients reached").into_response();
    }

    let client_id = ClientId::new(client_id);
    ws.on_upgrade(move |socket| client::run_client(socket, state, client_id))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        // Without a signal handler, keep serving.
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
