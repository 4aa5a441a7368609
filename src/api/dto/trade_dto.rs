//! Trade DTOs for the negotiation endpoints.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{OfferTerms, TradeResolution, VehicleId};

/// One side's proposed terms as submitted over the wire.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OfferTermsDto {
    /// Cash component in cents. Negative means cash requested back.
    #[serde(default)]
    pub cash_cents: i64,
    /// Vehicles this side puts into the trade.
    #[serde(default)]
    pub vehicle_ids: Vec<Uuid>,
}

impl From<OfferTermsDto> for OfferTerms {
    fn from(dto: OfferTermsDto) -> Self {
        Self::new(
            dto.cash_cents,
            dto.vehicle_ids.into_iter().map(VehicleId::from).collect(),
        )
    }
}

/// Request body for `POST /trades`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTradeRequest {
    /// Listing the offer targets.
    pub listing_id: Uuid,
    /// The offerer's initial terms.
    pub terms: OfferTermsDto,
    /// Optional note attached to the initial offer.
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for `POST /trades/:id/counter`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CounterOfferRequest {
    /// The acting side's replacement terms.
    pub terms: OfferTermsDto,
    /// Optional note attached to the counter.
    #[serde(default)]
    pub message: Option<String>,
    /// Client-chosen key to deduplicate retries of this submission.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Request body for `POST /trades/:id/accept`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AcceptOfferRequest {
    /// Client-chosen key to deduplicate retries of this submission.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Request body for `POST /trades/:id/resolve`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveTradeRequest {
    /// Which terminal state to move the trade to: `reject`, `decline`,
    /// or `cancel`.
    #[schema(value_type = String)]
    pub resolution: TradeResolution,
    /// Client-chosen key to deduplicate retries of this submission.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}
