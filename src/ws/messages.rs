//! WebSocket message types: envelope and client commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
///
/// State mutations stay on the REST surface; the socket carries only
/// ephemeral signals (typing) and presence queries.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Signal that the user started typing to a peer.
    TypingStart {
        /// Peer being typed to.
        peer_id: uuid::Uuid,
    },
    /// Signal that the user stopped typing to a peer.
    TypingStop {
        /// Peer being typed to.
        peer_id: uuid::Uuid,
    },
    /// Ask whether a set of users is currently online.
    Presence {
        /// Users to check.
        user_ids: Vec<uuid::Uuid>,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn command_parses_from_tagged_json() {
        let json = serde_json::json!({
            "command": "typing_start",
            "peer_id": uuid::Uuid::new_v4(),
        });
        let parsed: Result<WsCommand, _> = serde_json::from_value(json);
        assert!(matches!(parsed, Ok(WsCommand::TypingStart { .. })));
    }

    #[test]
    fn unknown_command_fails_to_parse() {
        let json = serde_json::json!({ "command": "subscribe", "topics": [] });
        let parsed: Result<WsCommand, _> = serde_json::from_value(json);
        assert!(parsed.is_err());
    }
}
