//! Bearer-token identity layer.
//!
//! Resolves an opaque bearer credential to an acting [`UserId`] for every
//! operation. The engine trusts this resolution completely and performs
//! no further authentication. Tokens are random, opaque, and held in
//! memory for the lifetime of the process.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio::sync::RwLock;

use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::MarketError;

/// Token-to-user resolution service.
#[derive(Debug, Default)]
pub struct AuthService {
    tokens: RwLock<HashMap<String, UserId>>,
}

impl AuthService {
    /// Creates an empty auth service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh opaque token for the given user.
    pub async fn issue_token(&self, user_id: UserId) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.tokens.write().await.insert(token.clone(), user_id);
        token
    }

    /// Resolves a token to the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Unauthorized`] for unknown tokens.
    pub async fn resolve(&self, token: &str) -> Result<UserId, MarketError> {
        self.tokens
            .read()
            .await
            .get(token)
            .copied()
            .ok_or_else(|| MarketError::Unauthorized("unknown or expired token".to_string()))
    }

    /// Invalidates a token.
    pub async fn revoke(&self, token: &str) {
        self.tokens.write().await.remove(token);
    }
}

/// The authenticated acting user, extracted from the
/// `Authorization: Bearer …` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = MarketError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                MarketError::Unauthorized("missing Authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            MarketError::Unauthorized("expected a Bearer token".to_string())
        })?;

        let user_id = state.auth_service.resolve(token).await?;
        Ok(Self(user_id))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_resolves_to_user() {
        let auth = AuthService::new();
        let user = UserId::new();
        let token = auth.issue_token(user).await;

        let resolved = auth.resolve(&token).await;
        let Ok(resolved) = resolved else {
            panic!("resolution failed");
        };
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let auth = AuthService::new();
        let result = auth.resolve("nope").await;
        assert!(matches!(result, Err(MarketError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn revoked_token_stops_resolving() {
        let auth = AuthService::new();
        let token = auth.issue_token(UserId::new()).await;
        auth.revoke(&token).await;
        assert!(auth.resolve(&token).await.is_err());
    }
}
