//! Marketplace user account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// A registered marketplace user.
///
/// The identity layer resolves bearer tokens to a [`UserId`]; this record
/// holds the profile data behind that id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier (immutable after registration).
    pub id: UserId,
    /// Login name, unique across the marketplace.
    pub username: String,
    /// Display name shown on listings and trades.
    pub display_name: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user record with a fresh id.
    #[must_use]
    pub fn new(username: String, display_name: String) -> Self {
        Self {
            id: UserId::new(),
            username,
            display_name,
            created_at: Utc::now(),
        }
    }
}
