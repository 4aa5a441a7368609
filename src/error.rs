//! Marketplace error types with HTTP status code mapping.
//!
//! [`MarketError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "trade is already in a terminal state",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                  |
/// |-----------|---------------------|------------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request              |
/// | 2000–2999 | State / Not Found   | 404 / 409 / 422              |
/// | 3000–3999 | Server              | 500 Internal Server Error    |
/// | 4000–4999 | Auth                | 401 / 403                    |
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// A referenced entity (trade, listing, vehicle, user, message) does
    /// not resolve.
    #[error("{0} not found")]
    NotFound(String),

    /// Actor is not a party to the trade / not the owner of the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Operation attempted against a terminal trade, an out-of-turn
    /// counter, or a listing still inside its renewal cooldown.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A referenced vehicle is already locked by another active trade or
    /// listing, or a versioned save lost a concurrent-write race.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed request payload: missing required fields or values out
    /// of their allowed range.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Missing or unresolvable bearer credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::ValidationFailed(_) => 1001,
            Self::NotFound(_) => 2001,
            Self::Conflict(_) => 2002,
            Self::InvalidState(_) => 2003,
            Self::Persistence(_) => 3001,
            Self::Internal(_) => 3000,
            Self::Unauthorized(_) => 4001,
            Self::Forbidden(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_by_kind() {
        assert_eq!(
            MarketError::NotFound("trade".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MarketError::Forbidden("not a party".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            MarketError::Conflict("vehicle locked".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MarketError::InvalidState("terminal".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            MarketError::ValidationFailed("missing terms".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MarketError::Unauthorized("no token".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn error_body_serializes_without_details() {
        let err = MarketError::InvalidState("trade is terminal".to_string());
        let body = ErrorResponse {
            error: ErrorBody {
                code: err.error_code(),
                message: err.to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("2003"));
        assert!(!json.contains("details"));
    }
}
