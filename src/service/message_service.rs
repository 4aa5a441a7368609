//! Direct messaging: append-only persistence plus read receipts.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    EventBus, ListingId, MarketEvent, MarketStore, Message, MessageId, TradeId, UserId,
};
use crate::error::MarketError;

/// Orchestration layer for direct messages.
#[derive(Debug, Clone)]
pub struct MessageService {
    store: Arc<MarketStore>,
    event_bus: EventBus,
}

impl MessageService {
    /// Creates a new `MessageService`.
    #[must_use]
    pub fn new(store: Arc<MarketStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Stores a message and notifies the receiver's live sessions.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the receiver does not exist,
    /// or [`MarketError::ValidationFailed`] for empty content or
    /// self-addressed messages.
    pub async fn send_message(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        trade_id: Option<TradeId>,
        listing_id: Option<ListingId>,
    ) -> Result<Message, MarketError> {
        if content.trim().is_empty() {
            return Err(MarketError::ValidationFailed(
                "message content must not be empty".to_string(),
            ));
        }
        if sender_id == receiver_id {
            return Err(MarketError::ValidationFailed(
                "cannot message yourself".to_string(),
            ));
        }
        let _receiver = self.store.get_user(receiver_id).await?;

        let message = Message::new(sender_id, receiver_id, content, trade_id, listing_id);
        let message_id = self.store.insert_message(message.clone()).await;

        let _ = self.event_bus.publish(MarketEvent::MessageReceived {
            message_id,
            sender_id,
            receiver_id,
            timestamp: Utc::now(),
        });

        tracing::debug!(%message_id, %sender_id, %receiver_id, "message stored");
        Ok(message)
    }

    /// Returns the conversation between the viewer and a peer, ordered by
    /// send time.
    pub async fn conversation(&self, viewer_id: UserId, peer_id: UserId) -> Vec<Message> {
        self.store.conversation(viewer_id, peer_id).await
    }

    /// Marks a message as read. The flag flips monotonically: a repeated
    /// call is a no-op, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] if the actor is not the
    /// receiver of the message.
    pub async fn mark_read(
        &self,
        message_id: MessageId,
        actor_id: UserId,
    ) -> Result<Message, MarketError> {
        let mut message = self.store.get_message(message_id).await?;
        if message.receiver_id != actor_id {
            return Err(MarketError::Forbidden(
                "only the receiver may mark a message read".to_string(),
            ));
        }
        if message.read {
            return Ok(message);
        }
        message.read = true;
        self.store.save_message(message).await
    }

    /// Counts unread messages addressed to the user.
    pub async fn unread_count(&self, user_id: UserId) -> usize {
        self.store.unread_count(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::User;

    async fn setup() -> (MessageService, UserId, UserId) {
        let store = Arc::new(MarketStore::new());
        let service = MessageService::new(Arc::clone(&store), EventBus::new(100));

        let Ok(a) = store
            .insert_user(User::new("ana".to_string(), "Ana".to_string()))
            .await
        else {
            panic!("insert failed");
        };
        let Ok(b) = store
            .insert_user(User::new("ben".to_string(), "Ben".to_string()))
            .await
        else {
            panic!("insert failed");
        };
        (service, a, b)
    }

    #[tokio::test]
    async fn send_and_fetch_conversation() {
        let (service, a, b) = setup().await;

        let Ok(_) = service.send_message(a, b, "hi".to_string(), None, None).await else {
            panic!("send failed");
        };
        let Ok(_) = service
            .send_message(b, a, "hello".to_string(), None, None)
            .await
        else {
            panic!("send failed");
        };

        let convo = service.conversation(a, b).await;
        assert_eq!(convo.len(), 2);
        assert_eq!(service.unread_count(b).await, 1);
    }

    #[tokio::test]
    async fn send_rejects_empty_and_self() {
        let (service, a, b) = setup().await;

        let empty = service.send_message(a, b, "  ".to_string(), None, None).await;
        assert!(matches!(empty, Err(MarketError::ValidationFailed(_))));

        let selfie = service.send_message(a, a, "hi me".to_string(), None, None).await;
        assert!(matches!(selfie, Err(MarketError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn send_rejects_unknown_receiver() {
        let (service, a, _b) = setup().await;
        let result = service
            .send_message(a, UserId::new(), "hi".to_string(), None, None)
            .await;
        assert!(matches!(result, Err(MarketError::NotFound(_))));
    }

    #[tokio::test]
    async fn read_flag_is_monotonic() {
        let (service, a, b) = setup().await;

        let Ok(message) = service.send_message(a, b, "hi".to_string(), None, None).await else {
            panic!("send failed");
        };

        // Sender may not mark it read.
        let wrong = service.mark_read(message.id, a).await;
        assert!(matches!(wrong, Err(MarketError::Forbidden(_))));

        let Ok(read) = service.mark_read(message.id, b).await else {
            panic!("mark_read failed");
        };
        assert!(read.read);

        // Second call is a no-op, not an error.
        let Ok(again) = service.mark_read(message.id, b).await else {
            panic!("repeated mark_read failed");
        };
        assert!(again.read);
        assert_eq!(service.unread_count(b).await, 0);
    }
}
