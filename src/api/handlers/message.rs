//! Direct messaging handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{SendMessageRequest, UnreadCountResponse};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{ListingId, MessageId, TradeId, UserId};
use crate::error::{ErrorResponse, MarketError};

/// `POST /messages` — Send a direct message.
///
/// The receiver's live WebSocket sessions are notified; offline
/// receivers find the message when they next fetch the conversation.
///
/// # Errors
///
/// Returns [`MarketError::ValidationFailed`] for empty content or
/// self-addressed messages.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    summary = "Send a message",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = serde_json::Value),
        (status = 400, description = "Empty content or self-addressed", body = ErrorResponse),
        (status = 404, description = "Receiver not found", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let message = state
        .message_service
        .send_message(
            user_id,
            UserId::from_uuid(req.receiver_id),
            req.content,
            req.trade_id.map(TradeId::from_uuid),
            req.listing_id.map(ListingId::from_uuid),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /messages/conversation/:peer_id` — Fetch the conversation with
/// a peer, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/messages/conversation/{peer_id}",
    tag = "Messages",
    summary = "Fetch a conversation",
    params(
        ("peer_id" = uuid::Uuid, Path, description = "The other participant's UUID"),
    ),
    responses(
        (status = 200, description = "Messages in send order", body = serde_json::Value),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(peer_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let messages = state
        .message_service
        .conversation(user_id, UserId::from_uuid(peer_id))
        .await;
    Json(messages)
}

/// `POST /messages/:id/read` — Mark a message as read.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] unless the caller is the
/// receiver.
#[utoipa::path(
    post,
    path = "/api/v1/messages/{id}/read",
    tag = "Messages",
    summary = "Mark a message read",
    description = "Flips the read flag. Repeating the call is a no-op, never an error.",
    params(
        ("id" = uuid::Uuid, Path, description = "Message UUID"),
    ),
    responses(
        (status = 200, description = "Updated message", body = serde_json::Value),
        (status = 403, description = "Caller is not the receiver", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse),
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let message = state
        .message_service
        .mark_read(MessageId::from_uuid(id), user_id)
        .await?;
    Ok(Json(message))
}

/// `GET /messages/unread-count` — Count unread messages for the caller.
#[utoipa::path(
    get,
    path = "/api/v1/messages/unread-count",
    tag = "Messages",
    summary = "Count unread messages",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> impl IntoResponse {
    let unread = state.message_service.unread_count(user_id).await;
    Json(UnreadCountResponse { unread })
}

/// Messaging routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/unread-count", get(unread_count))
        .route("/messages/conversation/{peer_id}", get(conversation))
        .route("/messages/{id}/read", post(mark_read))
}
