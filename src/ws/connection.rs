//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single authenticated connection:
//! registers with the connection registry, forwards bus events addressed
//! to the connected user, and dispatches the small set of socket
//! commands (typing signals, presence queries).

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::registry::ConnectionRegistry;
use crate::domain::{EventBus, MarketEvent, UserId};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Registers the session, emitting presence events on the first
///   connect and last close.
/// - Forwards matching events from the [`broadcast::Receiver`].
/// - Dispatches typing and presence commands from the client.
pub async fn run_connection(
    socket: WebSocket,
    user_id: UserId,
    mut event_rx: broadcast::Receiver<MarketEvent>,
    event_bus: EventBus,
    registry: Arc<ConnectionRegistry>,
) {
    if registry.register(user_id).await {
        let _ = event_bus.publish(MarketEvent::UserOnline {
            user_id,
            timestamp: Utc::now(),
        });
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response =
                            handle_text_message(&text, user_id, &event_bus, &registry).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from the EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(market_event) => {
                        if market_event.recipients().includes(user_id) {
                            let msg = WsMessage {
                                id: uuid::Uuid::new_v4().to_string(),
                                msg_type: WsMessageType::Event,
                                timestamp: Utc::now(),
                                payload: serde_json::to_value(&market_event).unwrap_or_default(),
                            };
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, %user_id, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    if registry.deregister(user_id).await {
        let _ = event_bus.publish(MarketEvent::UserOffline {
            user_id,
            timestamp: Utc::now(),
        });
    }

    tracing::debug!(%user_id, "ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    user_id: UserId,
    event_bus: &EventBus,
    registry: &Arc<ConnectionRegistry>,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return error_response(String::new(), 400, "malformed JSON");
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload.clone()) else {
        return error_response(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::TypingStart { peer_id } => {
            let _ = event_bus.publish(MarketEvent::TypingStarted {
                user_id,
                peer_id: UserId::from_uuid(peer_id),
                timestamp: Utc::now(),
            });
            None
        }
        WsCommand::TypingStop { peer_id } => {
            let _ = event_bus.publish(MarketEvent::TypingStopped {
                user_id,
                peer_id: UserId::from_uuid(peer_id),
                timestamp: Utc::now(),
            });
            None
        }
        WsCommand::Presence { user_ids } => {
            let mut online = Vec::with_capacity(user_ids.len());
            for id in &user_ids {
                if registry.is_online(UserId::from_uuid(*id)).await {
                    online.push(id.to_string());
                }
            }
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: Utc::now(),
                payload: serde_json::json!({ "online": online }),
            };
            serde_json::to_string(&response).ok()
        }
    }
}

fn error_response(id: String, code: u32, message: &str) -> Option<String> {
    let err = WsMessage {
        id,
        msg_type: WsMessageType::Error,
        timestamp: Utc::now(),
        payload: serde_json::json!({
            "code": code,
            "message": message,
        }),
    };
    serde_json::to_string(&err).ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn envelope(payload: serde_json::Value) -> String {
        serde_json::to_string(&WsMessage {
            id: "req-1".to_string(),
            msg_type: WsMessageType::Command,
            timestamp: Utc::now(),
            payload,
        })
        .unwrap_or_default()
    }

    #[tokio::test]
    async fn typing_start_publishes_to_peer() {
        let bus = EventBus::new(100);
        let registry = Arc::new(ConnectionRegistry::new());
        let mut rx = bus.subscribe();

        let user = UserId::new();
        let peer = uuid::Uuid::new_v4();
        let text = envelope(serde_json::json!({
            "command": "typing_start",
            "peer_id": peer,
        }));

        let response = handle_text_message(&text, user, &bus, &registry).await;
        assert!(response.is_none());

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "typing_started");
        assert!(event.recipients().includes(UserId::from_uuid(peer)));
        assert!(!event.recipients().includes(user));
    }

    #[tokio::test]
    async fn presence_query_reports_online_users() {
        let bus = EventBus::new(100);
        let registry = Arc::new(ConnectionRegistry::new());

        let online_user = UserId::new();
        let _ = registry.register(online_user).await;
        let offline_user = uuid::Uuid::new_v4();

        let text = envelope(serde_json::json!({
            "command": "presence",
            "user_ids": [online_user.as_uuid(), offline_user],
        }));

        let response = handle_text_message(&text, UserId::new(), &bus, &registry).await;
        let Some(response) = response else {
            panic!("expected response");
        };
        assert!(response.contains(&online_user.to_string()));
        assert!(!response.contains(&offline_user.to_string()));
    }

    #[tokio::test]
    async fn malformed_json_yields_error() {
        let bus = EventBus::new(100);
        let registry = Arc::new(ConnectionRegistry::new());

        let response = handle_text_message("not json", UserId::new(), &bus, &registry).await;
        let Some(response) = response else {
            panic!("expected error response");
        };
        assert!(response.contains("malformed JSON"));
    }

    #[tokio::test]
    async fn unknown_command_yields_error() {
        let bus = EventBus::new(100);
        let registry = Arc::new(ConnectionRegistry::new());

        let text = envelope(serde_json::json!({ "command": "subscribe" }));
        let response = handle_text_message(&text, UserId::new(), &bus, &registry).await;
        let Some(response) = response else {
            panic!("expected error response");
        };
        assert!(response.contains("unknown command"));
    }
}
