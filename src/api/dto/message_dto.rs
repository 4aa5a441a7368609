//! Messaging DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request body for `POST /messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// User the message is addressed to.
    pub receiver_id: Uuid,
    /// Message text.
    pub content: String,
    /// Optional trade the message refers to.
    #[serde(default)]
    pub trade_id: Option<Uuid>,
    /// Optional listing the message refers to.
    #[serde(default)]
    pub listing_id: Option<Uuid>,
}

/// Response body for `GET /messages/unread-count`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    /// Number of unread messages addressed to the caller.
    pub unread: usize,
}
