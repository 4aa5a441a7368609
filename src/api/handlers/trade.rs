//! Trade negotiation handlers: create, counter, accept, resolve, read.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AcceptOfferRequest, CounterOfferRequest, CreateTradeRequest, ResolveTradeRequest,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{ListingId, TradeId};
use crate::error::{ErrorResponse, MarketError};

/// `POST /trades` — Open a trade against a listing.
///
/// # Errors
///
/// Returns [`MarketError`] for inactive listings, self-trades,
/// unavailable vehicles, or malformed terms.
#[utoipa::path(
    post,
    path = "/api/v1/trades",
    tag = "Trades",
    summary = "Open a trade",
    description = "Submits an initial offer (cash and/or vehicles) against a listing. All offered vehicles are locked for the lifetime of the trade.",
    request_body = CreateTradeRequest,
    responses(
        (status = 201, description = "Trade opened", body = serde_json::Value),
        (status = 400, description = "Malformed terms", body = ErrorResponse),
        (status = 403, description = "Own listing or unowned vehicle", body = ErrorResponse),
        (status = 409, description = "Offered vehicle unavailable", body = ErrorResponse),
        (status = 422, description = "Listing no longer active", body = ErrorResponse),
    )
)]
pub async fn create_trade(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateTradeRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let trade = state
        .trade_service
        .create_trade(
            ListingId::from_uuid(req.listing_id),
            user_id,
            req.terms.into(),
            req.message,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(trade)))
}

/// `GET /trades` — List the caller's trades, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/trades",
    tag = "Trades",
    summary = "List own trades",
    responses(
        (status = 200, description = "Trade list", body = serde_json::Value),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_trades(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> impl IntoResponse {
    let trades = state.trade_service.list_trades_for(user_id).await;
    Json(trades)
}

/// `GET /trades/:id` — Trade detail with listing and counterparty
/// expanded. Parties only.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] for non-parties.
#[utoipa::path(
    get,
    path = "/api/v1/trades/{id}",
    tag = "Trades",
    summary = "Get trade details",
    description = "Returns the trade with its listing and the viewer's counterparty expanded inline where they still resolve.",
    params(
        ("id" = uuid::Uuid, Path, description = "Trade UUID"),
    ),
    responses(
        (status = 200, description = "Trade detail", body = serde_json::Value),
        (status = 403, description = "Not a party", body = ErrorResponse),
        (status = 404, description = "Trade not found", body = ErrorResponse),
    )
)]
pub async fn get_trade(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let detail = state
        .trade_service
        .get_trade(TradeId::from_uuid(id), user_id)
        .await?;
    Ok(Json(detail))
}

/// `POST /trades/:id/counter` — Replace the acting side's terms.
///
/// # Errors
///
/// Returns [`MarketError::InvalidState`] for terminal trades and
/// out-of-turn counters.
#[utoipa::path(
    post,
    path = "/api/v1/trades/{id}/counter",
    tag = "Trades",
    summary = "Submit a counter-offer",
    description = "Replaces the caller's side of the terms, resets both acceptance flags, and passes the turn to the other party.",
    params(
        ("id" = uuid::Uuid, Path, description = "Trade UUID"),
    ),
    request_body = CounterOfferRequest,
    responses(
        (status = 200, description = "Updated trade", body = serde_json::Value),
        (status = 403, description = "Not a party", body = ErrorResponse),
        (status = 422, description = "Terminal trade or not your turn", body = ErrorResponse),
    )
)]
pub async fn counter_offer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CounterOfferRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let trade = state
        .trade_service
        .counter_offer(
            TradeId::from_uuid(id),
            user_id,
            req.terms.into(),
            req.message,
            req.idempotency_key,
        )
        .await?;
    Ok(Json(trade))
}

/// `POST /trades/:id/accept` — Accept the current terms.
///
/// # Errors
///
/// Returns [`MarketError::InvalidState`] for terminal trades and for a
/// repeated acceptance of unchanged terms.
#[utoipa::path(
    post,
    path = "/api/v1/trades/{id}/accept",
    tag = "Trades",
    summary = "Accept the current terms",
    description = "Sets the caller's acceptance flag. When both sides have accepted, the trade completes: vehicles change owners and the listing is deactivated.",
    params(
        ("id" = uuid::Uuid, Path, description = "Trade UUID"),
    ),
    request_body = AcceptOfferRequest,
    responses(
        (status = 200, description = "Updated trade", body = serde_json::Value),
        (status = 403, description = "Not a party", body = ErrorResponse),
        (status = 422, description = "Terminal trade or already accepted", body = ErrorResponse),
    )
)]
pub async fn accept_offer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<AcceptOfferRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let trade = state
        .trade_service
        .accept_offer(TradeId::from_uuid(id), user_id, req.idempotency_key)
        .await?;
    Ok(Json(trade))
}

/// `POST /trades/:id/resolve` — Reject, decline, or cancel.
///
/// # Errors
///
/// Returns [`MarketError::InvalidState`] for already-terminal trades.
#[utoipa::path(
    post,
    path = "/api/v1/trades/{id}/resolve",
    tag = "Trades",
    summary = "Resolve a trade",
    description = "Moves the trade to a terminal failure state and releases every vehicle lock. The listing stays open for other offers.",
    params(
        ("id" = uuid::Uuid, Path, description = "Trade UUID"),
    ),
    request_body = ResolveTradeRequest,
    responses(
        (status = 200, description = "Resolved trade", body = serde_json::Value),
        (status = 403, description = "Not a party", body = ErrorResponse),
        (status = 422, description = "Trade already terminal", body = ErrorResponse),
    )
)]
pub async fn resolve_trade(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<ResolveTradeRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let trade = state
        .trade_service
        .resolve(
            TradeId::from_uuid(id),
            user_id,
            req.resolution,
            req.idempotency_key,
        )
        .await?;
    Ok(Json(trade))
}

/// Trade negotiation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trades", get(list_trades).post(create_trade))
        .route("/trades/{id}", get(get_trade))
        .route("/trades/{id}/counter", post(counter_offer))
        .route("/trades/{id}/accept", post(accept_offer))
        .route("/trades/{id}/resolve", post(resolve_trade))
}
