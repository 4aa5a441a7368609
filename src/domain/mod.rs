//! Domain layer: entities, events, event bus, and the document store.
//!
//! This module contains the marketplace domain model: typed entity ids,
//! the vehicle/listing/trade/message entities with their invariants, the
//! event bus for broadcasting state changes, and the in-memory store with
//! versioned saves.

pub mod entity_ref;
pub mod event;
pub mod event_bus;
pub mod ids;
pub mod listing;
pub mod message;
pub mod store;
pub mod trade;
pub mod user;
pub mod vehicle;

pub use entity_ref::EntityRef;
pub use event::{MarketEvent, Recipients};
pub use event_bus::EventBus;
pub use ids::{ListingId, MessageId, TradeId, UserId, VehicleId};
pub use listing::{Listing, ListingChange, ListingField};
pub use message::Message;
pub use store::MarketStore;
pub use trade::{
    OfferTerms, Party, Trade, TradeAction, TradeHistoryEntry, TradeResolution, TradeStatus,
};
pub use user::User;
pub use vehicle::Vehicle;
