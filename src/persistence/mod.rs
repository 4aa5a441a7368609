//! Persistence layer: PostgreSQL event log.
//!
//! Provides durable, append-only storage for market events so that
//! trade histories and listing activity survive process restarts. The
//! concrete implementation uses `sqlx::PgPool` for async PostgreSQL
//! access.

pub mod models;
pub mod postgres;
