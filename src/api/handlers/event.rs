//! Durable event log replay handler.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};

use crate::api::dto::EventLogParams;
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, MarketError};

/// `GET /events` — Replay stored events, e.g. to backfill a client
/// after a WebSocket reconnect.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] when the server runs without a
/// durable event log.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Replay stored events",
    description = "Returns events recorded after the given instant, oldest first, optionally restricted to one entity. Available only when the durable event log is enabled.",
    params(EventLogParams),
    responses(
        (status = 200, description = "Stored events", body = serde_json::Value),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Event log disabled", body = ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(params): Query<EventLogParams>,
) -> Result<impl IntoResponse, MarketError> {
    let Some(event_log) = state.event_log.as_ref() else {
        return Err(MarketError::NotFound("event log".to_string()));
    };
    let after = params.after.unwrap_or(DateTime::<Utc>::MIN_UTC);
    let events = event_log.load_events_after(after, params.subject_id).await?;
    Ok(Json(events))
}

/// Event log routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", get(list_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::AuthService;
    use crate::domain::{EventBus, MarketStore, UserId};
    use crate::service::{
        IdempotencyCache, ListingService, MessageService, TradeService, VehicleService,
    };
    use crate::ws::ConnectionRegistry;

    fn make_state() -> AppState {
        let store = Arc::new(MarketStore::new());
        let event_bus = EventBus::new(100);
        let idempotency = Arc::new(IdempotencyCache::new(300));
        AppState {
            trade_service: Arc::new(TradeService::new(
                Arc::clone(&store),
                event_bus.clone(),
                idempotency,
            )),
            listing_service: Arc::new(ListingService::new(
                Arc::clone(&store),
                event_bus.clone(),
                12,
            )),
            vehicle_service: Arc::new(VehicleService::new(Arc::clone(&store), event_bus.clone())),
            message_service: Arc::new(MessageService::new(Arc::clone(&store), event_bus.clone())),
            auth_service: Arc::new(AuthService::new()),
            connections: Arc::new(ConnectionRegistry::new()),
            event_log: None,
            store,
            event_bus,
        }
    }

    #[tokio::test]
    async fn replay_requires_event_log() {
        let state = make_state();
        let params = EventLogParams {
            after: None,
            subject_id: None,
        };
        let result = list_events(State(state), AuthUser(UserId::new()), Query(params)).await;
        assert!(matches!(result, Err(MarketError::NotFound(_))));
    }
}
