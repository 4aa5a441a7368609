//! Direct message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListingId, MessageId, TradeId, UserId};

/// A direct message between two users.
///
/// Pure append-only log; the `read` flag flips monotonically from
/// `false` to `true` and never back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Sending user.
    pub sender_id: UserId,
    /// Receiving user.
    pub receiver_id: UserId,
    /// Message body.
    pub content: String,
    /// Optional trade this message refers to.
    pub trade_id: Option<TradeId>,
    /// Optional listing this message refers to.
    pub listing_id: Option<ListingId>,
    /// Whether the receiver has read the message.
    pub read: bool,
    /// Send timestamp.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Creates a new unread message.
    #[must_use]
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        trade_id: Option<TradeId>,
        listing_id: Option<ListingId>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            sender_id,
            receiver_id,
            content,
            trade_id,
            listing_id,
            read: false,
            sent_at: Utc::now(),
        }
    }
}
