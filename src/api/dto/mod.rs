//! Data Transfer Objects for REST request/response serialization.
//!
//! All monetary amounts are integer cents; fractional currency never
//! crosses the wire.

pub mod auth_dto;
pub mod common_dto;
pub mod event_dto;
pub mod listing_dto;
pub mod message_dto;
pub mod trade_dto;
pub mod vehicle_dto;

pub use auth_dto::*;
pub use common_dto::*;
pub use event_dto::*;
pub use listing_dto::*;
pub use message_dto::*;
pub use trade_dto::*;
pub use vehicle_dto::*;
