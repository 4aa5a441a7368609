//! WebSocket layer: connection handling, message routing, presence.
//!
//! The WebSocket endpoint at `/ws` carries the real-time surface: market
//! events fanned out per recipient, typing signals, and presence
//! queries. All state mutations stay on the REST surface.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod registry;

pub use registry::ConnectionRegistry;
