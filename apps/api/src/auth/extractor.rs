use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::errors::AppError;
use crate::platform::UserSession;
use crate::state::AppState;

/// A signed-in caller. Rejects with 401 when the bearer token is missing or revoked.
pub struct AuthSession(pub UserSession);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = state
            .platform
            .auth
            .user_for_token(token)
            .await?
            .ok_or_else(|| {
                debug!("Rejected unknown session token");
                AppError::Unauthorized
            })?;
        Ok(AuthSession(state.platform.session_for(token.to_string(), user)))
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
