//! Listing handlers: browse, create, edit, renew, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateListingRequest, ListingListResponse, PaginationParams, UpdateListingRequest,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Listing, ListingId, VehicleId};
use crate::error::{ErrorResponse, MarketError};

/// `POST /listings` — List a vehicle for sale.
///
/// # Errors
///
/// Returns [`MarketError::Conflict`] if the vehicle is already listed,
/// auctioned, or in a trade.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    tag = "Listings",
    summary = "Create a listing",
    description = "Puts one of the caller's vehicles up for sale. The vehicle must be free of listing, auction, and trade locks.",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = serde_json::Value),
        (status = 400, description = "Non-positive price", body = ErrorResponse),
        (status = 403, description = "Not the vehicle owner", body = ErrorResponse),
        (status = 409, description = "Vehicle unavailable", body = ErrorResponse),
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let listing = state
        .listing_service
        .create_listing(
            VehicleId::from_uuid(req.vehicle_id),
            user_id,
            req.price_cents,
            req.description,
            req.tags,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// `GET /listings` — Browse active listings, most recently renewed
/// first.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    tag = "Listings",
    summary = "Browse active listings",
    description = "Returns a paginated page of active listings ordered by last renewal, newest first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated listing page", body = serde_json::Value),
    )
)]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let params = params.clamped();
    let listings = state.listing_service.list_active().await;

    let (pagination, start, take) = params.paginate(listings.len());
    let data: Vec<Listing> = listings.into_iter().skip(start).take(take).collect();

    Json(ListingListResponse { data, pagination })
}

/// `GET /listings/:id` — View a listing, bumping its view counter.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] if the listing does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    tag = "Listings",
    summary = "View a listing",
    description = "Returns the listing and increments its view counter.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    responses(
        (status = 200, description = "Listing details", body = serde_json::Value),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    )
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let listing = state
        .listing_service
        .view_listing(ListingId::from_uuid(id))
        .await?;
    Ok(Json(listing))
}

/// `PATCH /listings/:id` — Edit price or description.
///
/// Every applied change lands in the listing's history before it takes
/// effect; the original asking price is never rewritten.
///
/// # Errors
///
/// Returns the usual ownership and validation errors.
#[utoipa::path(
    patch,
    path = "/api/v1/listings/{id}",
    tag = "Listings",
    summary = "Update a listing",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Updated listing", body = serde_json::Value),
        (status = 400, description = "Non-positive price", body = ErrorResponse),
        (status = 403, description = "Not the seller", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    )
)]
pub async fn update_listing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateListingRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let listing = state
        .listing_service
        .update_listing(
            ListingId::from_uuid(id),
            user_id,
            req.price_cents,
            req.description,
        )
        .await?;
    Ok(Json(listing))
}

/// `POST /listings/:id/renew` — Bump the listing's recency sort signal.
///
/// # Errors
///
/// Returns [`MarketError::InvalidState`] while the renewal cooldown has
/// not elapsed.
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/renew",
    tag = "Listings",
    summary = "Renew a listing",
    description = "Moves the listing back to the top of the browse order. Rate-limited by a server-side cooldown.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    responses(
        (status = 200, description = "Renewed listing", body = serde_json::Value),
        (status = 403, description = "Not the seller", body = ErrorResponse),
        (status = 422, description = "Cooldown not elapsed", body = ErrorResponse),
    )
)]
pub async fn renew_listing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let listing = state
        .listing_service
        .renew_listing(ListingId::from_uuid(id), user_id)
        .await?;
    Ok(Json(listing))
}

/// `DELETE /listings/:id` — Take a listing down.
///
/// # Errors
///
/// Returns [`MarketError::Conflict`] while open trades still reference
/// the listing.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    tag = "Listings",
    summary = "Delete a listing",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 403, description = "Not the seller", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 409, description = "Open trades reference the listing", body = ErrorResponse),
    )
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .listing_service
        .delete_listing(ListingId::from_uuid(id), user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Listing routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(list_listings).post(create_listing))
        .route(
            "/listings/{id}",
            get(get_listing).patch(update_listing).delete(delete_listing),
        )
        .route("/listings/{id}/renew", post(renew_listing))
}
