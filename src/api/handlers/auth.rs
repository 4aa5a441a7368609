//! Registration and login handlers.
//!
//! Identity is deliberately thin: a username maps to a user record and a
//! login mints an opaque bearer token. Password verification is outside
//! this service's scope; the engine only needs a resolvable acting user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::app_state::AppState;
use crate::domain::User;
use crate::error::{ErrorResponse, MarketError};

/// `POST /auth/register` — Create a user and issue a token.
///
/// # Errors
///
/// Returns [`MarketError::Conflict`] when the username is taken and
/// [`MarketError::ValidationFailed`] for a blank username.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    summary = "Register a new user",
    description = "Creates a user with a unique username and returns a bearer token for immediate use.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Blank username", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(MarketError::ValidationFailed(
            "username must not be blank".to_string(),
        ));
    }
    let display_name = req.display_name.unwrap_or_else(|| username.clone());

    let user = User::new(username.clone(), display_name);
    let user_id = state.store.insert_user(user).await?;
    let token = state.auth_service.issue_token(user_id).await;

    tracing::info!(%user_id, %username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user_id.into(),
            username,
            token,
        }),
    ))
}

/// `POST /auth/login` — Issue a fresh token for an existing user.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] for unknown usernames.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    summary = "Log in",
    description = "Resolves a username to its user and returns a fresh bearer token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 404, description = "Unknown username", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let user = state.store.find_user_by_username(&req.username).await?;
    let token = state.auth_service.issue_token(user.id).await;

    Ok(Json(AuthResponse {
        user_id: user.id.into(),
        username: user.username,
        token,
    }))
}

/// Auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}
