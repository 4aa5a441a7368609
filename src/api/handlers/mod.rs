//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod event;
pub mod listing;
pub mod message;
pub mod system;
pub mod trade;
pub mod vehicle;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(vehicle::routes())
        .merge(listing::routes())
        .merge(trade::routes())
        .merge(message::routes())
        .merge(event::routes())
}
