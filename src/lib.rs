//! # tradeyard
//!
//! REST API and WebSocket backend for a peer-to-peer vehicle trading
//! marketplace.
//!
//! Users catalog vehicles, list them for sale, and negotiate trades
//! combining cash and vehicles from both sides. The negotiation engine
//! enforces strict turn alternation, dual acceptance, and vehicle
//! locking; real-time events reach the parties over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler + ConnectionRegistry (ws/)
//!     │
//!     ├── TradeService / ListingService /
//!     │   VehicleService / MessageService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── MarketStore (domain/)
//!     │
//!     └── PostgreSQL event log (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
