//! Axum route handlers for sign-in, sign-out and the current user.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthSession;
use crate::errors::AppError;
use crate::platform::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/v1/auth/sign-in
///
/// The first sign-in for a username registers it with the given password.
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("password cannot be empty".to_string()));
    }
    let session = state
        .platform
        .auth
        .sign_in(username, &request.password)
        .await?;
    Ok(Json(SignInResponse {
        token: session.token,
        user: session.user,
    }))
}

/// POST /api/v1/auth/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<StatusCode, AppError> {
    state.platform.auth.sign_out(&session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn handle_me(AuthSession(session): AuthSession) -> Json<User> {
    Json(session.user)
}
