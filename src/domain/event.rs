//! Domain events pushed to connected users after state mutations.
//!
//! Every mutation publishes a [`MarketEvent`] through the
//! [`super::EventBus`]. WebSocket connections subscribe to the bus and
//! forward the events whose [`Recipients`] include the connected user.
//! Delivery is at-most-once and best-effort; offline users get no
//! backfill through this channel.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ListingId, MessageId, TradeId, TradeStatus, UserId, VehicleId};

/// Who an event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// A specific set of users (trade parties, a message receiver, …).
    Users(Vec<UserId>),
    /// Every connected session.
    Broadcast,
}

impl Recipients {
    /// Returns `true` if the event should be delivered to `user_id`.
    #[must_use]
    pub fn includes(&self, user_id: UserId) -> bool {
        match self {
            Self::Users(ids) => ids.contains(&user_id),
            Self::Broadcast => true,
        }
    }
}

/// Domain event emitted after a state mutation or presence change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A new trade was opened against a listing.
    TradeCreated {
        /// Trade identifier.
        trade_id: TradeId,
        /// Listing the trade targets.
        listing_id: ListingId,
        /// Offering user.
        offerer_id: UserId,
        /// Listing owner.
        receiver_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A trade changed state (counter, acceptance, terminal resolution).
    TradeUpdated {
        /// Trade identifier.
        trade_id: TradeId,
        /// Status after the transition.
        status: TradeStatus,
        /// User who triggered the transition.
        actor_id: UserId,
        /// Both parties, for delivery targeting.
        participants: [UserId; 2],
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A trade reached mutual acceptance and completed.
    TradeCompleted {
        /// Trade identifier.
        trade_id: TradeId,
        /// Listing that was deactivated by the completion.
        listing_id: ListingId,
        /// Both parties.
        participants: [UserId; 2],
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A new listing went live.
    ListingAdded {
        /// Listing identifier.
        listing_id: ListingId,
        /// Listed vehicle.
        vehicle_id: VehicleId,
        /// Listing owner.
        seller_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A listing was edited, renewed, or deactivated.
    ListingUpdated {
        /// Listing identifier.
        listing_id: ListingId,
        /// Whether the listing is still open for offers.
        is_active: bool,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A listing was deleted by its owner.
    ListingDeleted {
        /// Listing identifier.
        listing_id: ListingId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A direct message was stored for the receiver.
    MessageReceived {
        /// Message identifier.
        message_id: MessageId,
        /// Sending user.
        sender_id: UserId,
        /// Receiving user.
        receiver_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A vehicle was cataloged.
    VehicleAdded {
        /// Vehicle identifier.
        vehicle_id: VehicleId,
        /// Owner.
        owner_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A vehicle's attributes or status flags changed.
    VehicleUpdated {
        /// Vehicle identifier.
        vehicle_id: VehicleId,
        /// Current owner (may have changed through trade completion).
        owner_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A user's first session connected.
    UserOnline {
        /// User who came online.
        user_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A user's last session disconnected.
    UserOffline {
        /// User who went offline.
        user_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A user started typing to a peer.
    TypingStarted {
        /// Typing user.
        user_id: UserId,
        /// Peer being typed to.
        peer_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A user stopped typing to a peer.
    TypingStopped {
        /// User who stopped typing.
        user_id: UserId,
        /// Peer being typed to.
        peer_id: UserId,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Returns the delivery target for this event.
    #[must_use]
    pub fn recipients(&self) -> Recipients {
        match self {
            Self::TradeCreated {
                offerer_id,
                receiver_id,
                ..
            } => Recipients::Users(vec![*offerer_id, *receiver_id]),
            Self::TradeUpdated { participants, .. } | Self::TradeCompleted { participants, .. } => {
                Recipients::Users(participants.to_vec())
            }
            Self::MessageReceived { receiver_id, .. } => Recipients::Users(vec![*receiver_id]),
            Self::TypingStarted { peer_id, .. } | Self::TypingStopped { peer_id, .. } => {
                Recipients::Users(vec![*peer_id])
            }
            Self::VehicleAdded { owner_id, .. } | Self::VehicleUpdated { owner_id, .. } => {
                Recipients::Users(vec![*owner_id])
            }
            Self::ListingAdded { .. }
            | Self::ListingUpdated { .. }
            | Self::ListingDeleted { .. }
            | Self::UserOnline { .. }
            | Self::UserOffline { .. } => Recipients::Broadcast,
        }
    }

    /// Returns the ID of the entity the event is about, for the durable
    /// event log. Ephemeral signals (typing, presence) return `None`
    /// and are never persisted.
    #[must_use]
    pub const fn subject_id(&self) -> Option<uuid::Uuid> {
        match self {
            Self::TradeCreated { trade_id, .. }
            | Self::TradeUpdated { trade_id, .. }
            | Self::TradeCompleted { trade_id, .. } => Some(*trade_id.as_uuid()),
            Self::ListingAdded { listing_id, .. }
            | Self::ListingUpdated { listing_id, .. }
            | Self::ListingDeleted { listing_id, .. } => Some(*listing_id.as_uuid()),
            Self::MessageReceived { message_id, .. } => Some(*message_id.as_uuid()),
            Self::VehicleAdded { vehicle_id, .. } | Self::VehicleUpdated { vehicle_id, .. } => {
                Some(*vehicle_id.as_uuid())
            }
            Self::UserOnline { .. }
            | Self::UserOffline { .. }
            | Self::TypingStarted { .. }
            | Self::TypingStopped { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::TradeCreated { .. } => "trade_created",
            Self::TradeUpdated { .. } => "trade_updated",
            Self::TradeCompleted { .. } => "trade_completed",
            Self::ListingAdded { .. } => "listing_added",
            Self::ListingUpdated { .. } => "listing_updated",
            Self::ListingDeleted { .. } => "listing_deleted",
            Self::MessageReceived { .. } => "message_received",
            Self::VehicleAdded { .. } => "vehicle_added",
            Self::VehicleUpdated { .. } => "vehicle_updated",
            Self::UserOnline { .. } => "user_online",
            Self::UserOffline { .. } => "user_offline",
            Self::TypingStarted { .. } => "typing_started",
            Self::TypingStopped { .. } => "typing_stopped",
        }
    }
}
