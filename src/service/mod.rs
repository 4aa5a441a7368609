//! Service layer: business logic orchestration.
//!
//! [`TradeService`] owns the negotiation protocol; [`ListingService`],
//! [`VehicleService`], and [`MessageService`] cover the surrounding CRUD
//! lifecycles. Every mutation emits events through the
//! [`crate::domain::EventBus`].

pub mod idempotency;
pub mod listing_service;
pub mod message_service;
pub mod trade_service;
pub mod vehicle_service;

pub use idempotency::IdempotencyCache;
pub use listing_service::ListingService;
pub use message_service::MessageService;
pub use trade_service::{TradeDetail, TradeService};
pub use vehicle_service::{VehicleService, VehicleUpdate};
