//! Axum route handlers for the onboarding flag.

use axum::Json;
use serde::Serialize;

use crate::auth::extractor::AuthSession;
use crate::errors::AppError;
use crate::onboarding;

#[derive(Debug, Serialize)]
pub struct OnboardingStatus {
    pub completed: bool,
}

/// GET /api/v1/onboarding
pub async fn handle_get(
    AuthSession(session): AuthSession,
) -> Result<Json<OnboardingStatus>, AppError> {
    let completed = onboarding::is_completed(&session.kv, &session.user.username).await?;
    Ok(Json(OnboardingStatus { completed }))
}

/// PUT /api/v1/onboarding
pub async fn handle_complete(
    AuthSession(session): AuthSession,
) -> Result<Json<OnboardingStatus>, AppError> {
    onboarding::mark_completed(&session.kv, &session.user.username).await?;
    Ok(Json(OnboardingStatus { completed: true }))
}

/// DELETE /api/v1/onboarding
pub async fn handle_reset(
    AuthSession(session): AuthSession,
) -> Result<Json<OnboardingStatus>, AppError> {
    onboarding::reset(&session.kv, &session.user.username).await?;
    Ok(Json(OnboardingStatus { completed: false }))
}
