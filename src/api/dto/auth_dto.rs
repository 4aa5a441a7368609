//! DTOs for registration and login.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Unique login handle.
    pub username: String,
    /// Display name shown to other users.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login handle registered earlier.
    pub username: String,
}

/// Response body for both auth endpoints: the identity plus a fresh
/// bearer token.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Identifier of the authenticated user.
    pub user_id: Uuid,
    /// Login handle.
    pub username: String,
    /// Opaque bearer token for subsequent requests.
    pub token: String,
}
