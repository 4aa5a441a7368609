//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::AuthService;
use crate::domain::{EventBus, MarketStore};
use crate::persistence::postgres::PostgresEventLog;
use crate::service::{ListingService, MessageService, TradeService, VehicleService};
use crate::ws::ConnectionRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Document store behind all services.
    pub store: Arc<MarketStore>,
    /// Trade negotiation engine.
    pub trade_service: Arc<TradeService>,
    /// Listing lifecycle service.
    pub listing_service: Arc<ListingService>,
    /// Vehicle catalog service.
    pub vehicle_service: Arc<VehicleService>,
    /// Direct messaging service.
    pub message_service: Arc<MessageService>,
    /// Bearer-token identity layer.
    pub auth_service: Arc<AuthService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Live WebSocket connection registry.
    pub connections: Arc<ConnectionRegistry>,
    /// Durable event log, present when persistence is enabled.
    pub event_log: Option<Arc<PostgresEventLog>>,
}
