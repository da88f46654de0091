use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ai::catalog::UseCase;
use crate::ai::orchestrator::TerminalError;
use crate::platform::PlatformError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Every candidate model failed.
    #[error(transparent)]
    AiUnavailable(#[from] TerminalError),

    /// No AI transport is configured for this deployment.
    #[error("AI transport not configured")]
    TransportUnavailable,

    /// The model answered but the answer could not be used.
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// A pipeline stage failed; `status` is what the user sees.
    #[error("{status}: {source}")]
    Stage {
        status: &'static str,
        #[source]
        source: PlatformError,
    },

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::AiUnavailable(e) => {
                tracing::error!("AI unavailable after {} attempts: {e}", e.attempts.len());
                let message = match e.use_case {
                    UseCase::Chat => {
                        "AI service is currently unavailable. Please try again in a few minutes."
                    }
                    UseCase::Feedback => {
                        "Resume analysis service is currently unavailable. Please try again later."
                    }
                };
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "AI_UNAVAILABLE",
                    message.to_string(),
                )
            }
            AppError::TransportUnavailable => {
                tracing::error!("AI request rejected: no transport configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "AI_NOT_CONFIGURED",
                    "AI service is not configured".to_string(),
                )
            }
            AppError::Analysis(msg) => {
                tracing::error!("Analysis error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ANALYSIS_ERROR",
                    "Failed to analyze resume".to_string(),
                )
            }
            AppError::Stage { status, source } => {
                tracing::error!("{status}: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PIPELINE_ERROR",
                    status.to_string(),
                )
            }
            AppError::Platform(PlatformError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid username or password".to_string(),
            ),
            AppError::Platform(PlatformError::NotFound(what)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {what}"),
            ),
            AppError::Platform(e) => {
                tracing::error!("Platform error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PLATFORM_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
