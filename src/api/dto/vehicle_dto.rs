//! Vehicle DTOs for create and update operations.

use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /vehicles`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVehicleRequest {
    /// Manufacturer (e.g. `"Mazda"`).
    pub make: String,
    /// Model name (e.g. `"MX-5"`).
    pub model: String,
    /// Model year.
    pub year: u16,
    /// Vehicle identification number.
    #[serde(default)]
    pub vin: String,
    /// Odometer reading.
    #[serde(default)]
    pub mileage: u32,
    /// Transmission type (free-form, e.g. `"manual"`).
    #[serde(default)]
    pub transmission: String,
    /// Estimated value in cents.
    #[serde(default)]
    pub valuation_cents: i64,
}

/// Request body for `PATCH /vehicles/:id`. Absent fields are left
/// unchanged; status flags are never editable here.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVehicleRequest {
    /// New odometer reading.
    #[serde(default)]
    pub mileage: Option<u32>,
    /// New estimated valuation in cents.
    #[serde(default)]
    pub valuation_cents: Option<i64>,
    /// Replacement image URL list.
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
}
