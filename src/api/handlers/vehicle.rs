//! Vehicle catalog handlers: create, list, get, update, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::VehicleId;
use crate::error::{ErrorResponse, MarketError};
use crate::service::VehicleUpdate;

/// `POST /vehicles` — Catalog a vehicle for the authenticated user.
///
/// # Errors
///
/// Returns [`MarketError::ValidationFailed`] for a blank make/model or
/// an implausible year.
#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    tag = "Vehicles",
    summary = "Catalog a vehicle",
    description = "Adds a vehicle to the caller's garage. Status flags start clear; listing and trading set them later.",
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, description = "Vehicle cataloged", body = serde_json::Value),
        (status = 400, description = "Invalid attributes", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateVehicleRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let vehicle = state
        .vehicle_service
        .create_vehicle(
            user_id,
            req.make,
            req.model,
            req.year,
            req.vin,
            req.mileage,
            req.transmission,
            req.valuation_cents,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// `GET /vehicles` — List the authenticated user's vehicles.
#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    tag = "Vehicles",
    summary = "List own vehicles",
    description = "Returns every vehicle in the caller's garage.",
    responses(
        (status = 200, description = "Vehicle list", body = serde_json::Value),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> impl IntoResponse {
    let vehicles = state.vehicle_service.list_for_owner(user_id).await;
    Json(vehicles)
}

/// `GET /vehicles/:id` — Get a single vehicle.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] if the vehicle does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}",
    tag = "Vehicles",
    summary = "Get vehicle details",
    params(
        ("id" = uuid::Uuid, Path, description = "Vehicle UUID"),
    ),
    responses(
        (status = 200, description = "Vehicle details", body = serde_json::Value),
        (status = 404, description = "Vehicle not found", body = ErrorResponse),
    )
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let vehicle = state
        .vehicle_service
        .get_vehicle(VehicleId::from_uuid(id))
        .await?;
    Ok(Json(vehicle))
}

/// `PATCH /vehicles/:id` — Edit mileage, valuation, or images.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] for non-owners.
#[utoipa::path(
    patch,
    path = "/api/v1/vehicles/{id}",
    tag = "Vehicles",
    summary = "Update a vehicle",
    description = "Owner-only edits to mileage, valuation, and images. Status flags cannot be set through this endpoint.",
    params(
        ("id" = uuid::Uuid, Path, description = "Vehicle UUID"),
    ),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Updated vehicle", body = serde_json::Value),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Vehicle not found", body = ErrorResponse),
    )
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateVehicleRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let vehicle = state
        .vehicle_service
        .update_vehicle(
            VehicleId::from_uuid(id),
            user_id,
            VehicleUpdate {
                mileage: req.mileage,
                valuation_cents: req.valuation_cents,
                image_urls: req.image_urls,
            },
        )
        .await?;
    Ok(Json(vehicle))
}

/// `DELETE /vehicles/:id` — Remove a vehicle from the catalog.
///
/// # Errors
///
/// Returns [`MarketError::Conflict`] while the vehicle is listed or in
/// a trade.
#[utoipa::path(
    delete,
    path = "/api/v1/vehicles/{id}",
    tag = "Vehicles",
    summary = "Delete a vehicle",
    params(
        ("id" = uuid::Uuid, Path, description = "Vehicle UUID"),
    ),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Vehicle not found", body = ErrorResponse),
        (status = 409, description = "Vehicle is listed or in a trade", body = ErrorResponse),
    )
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .vehicle_service
        .delete_vehicle(VehicleId::from_uuid(id), user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Vehicle catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route(
            "/vehicles/{id}",
            get(get_vehicle).patch(update_vehicle).delete(delete_vehicle),
        )
}
