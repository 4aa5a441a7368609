//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::MarketError;

/// Query parameters accepted by the WebSocket endpoint.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Bearer token issued at login. Browsers cannot set headers on
    /// WebSocket upgrades, so the credential travels as a query param.
    pub token: String,
}

/// `GET /ws?token=…` — Upgrade HTTP connection to WebSocket.
///
/// The token is resolved before the upgrade; unauthenticated clients
/// are refused with `401` instead of being upgraded.
///
/// # Errors
///
/// Returns [`MarketError::Unauthorized`] for an unknown token.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, MarketError> {
    let user_id = state.auth_service.resolve(&params.token).await?;

    let event_rx = state.event_bus.subscribe();
    let event_bus = state.event_bus.clone();
    let registry = std::sync::Arc::clone(&state.connections);

    Ok(ws.on_upgrade(move |socket| {
        run_connection(socket, user_id, event_rx, event_bus, registry)
    }))
}
