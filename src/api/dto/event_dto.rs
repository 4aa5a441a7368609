//! DTOs for the durable event log endpoint.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

/// Query parameters for event log replay.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct EventLogParams {
    /// Return only events recorded after this instant (RFC 3339).
    /// Defaults to the beginning of the log.
    pub after: Option<DateTime<Utc>>,
    /// Restrict to events about a single entity.
    pub subject_id: Option<Uuid>,
}
