//! Axum route handlers for direct AI access.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::ai::types::{AiResponse, ChatOptions, ChatPayload};
use crate::auth::extractor::AuthSession;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatApiRequest {
    /// A plain string or a list of chat messages.
    pub prompt: ChatPayload,
    #[serde(flatten)]
    pub options: ChatOptions,
}

/// POST /api/v1/ai/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(request): Json<ChatApiRequest>,
) -> Result<Json<AiResponse>, AppError> {
    match &request.prompt {
        ChatPayload::Prompt(text) if text.trim().is_empty() => {
            return Err(AppError::Validation("prompt cannot be empty".to_string()));
        }
        ChatPayload::Messages(messages) if messages.is_empty() => {
            return Err(AppError::Validation("messages cannot be empty".to_string()));
        }
        _ => {}
    }
    let response = state
        .platform
        .ai
        .chat(request.prompt, request.options)
        .await?;
    Ok(Json(response))
}
