//! Listing DTOs for create, update, and list operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common_dto::PaginationMeta;
use crate::domain::Listing;

/// Request body for `POST /listings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    /// Vehicle being offered for sale.
    pub vehicle_id: Uuid,
    /// Asking price in cents.
    pub price_cents: i64,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for `PATCH /listings/:id`. Absent fields are left
/// unchanged; every applied change lands in the listing history.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateListingRequest {
    /// New asking price in cents.
    #[serde(default)]
    pub price_cents: Option<i64>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Paginated list response for `GET /listings`.
#[derive(Debug, Serialize)]
pub struct ListingListResponse {
    /// Listings on this page, most recently renewed first.
    pub data: Vec<Listing>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
