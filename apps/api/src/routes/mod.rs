pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::ai::handlers as ai;
use crate::auth::handlers as auth;
use crate::onboarding::handlers as onboarding;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

/// Room for the multipart framing and text fields around the file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/sign-in", post(auth::handle_sign_in))
        .route("/api/v1/auth/sign-out", post(auth::handle_sign_out))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // AI
        .route("/api/v1/ai/chat", post(ai::handle_chat))
        // Resumes
        .route(
            "/api/v1/resumes",
            post(resumes::handle_upload).get(resumes::handle_list),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get).delete(resumes::handle_delete),
        )
        .route("/api/v1/resumes/:id/file", get(resumes::handle_get_file))
        .route("/api/v1/resumes/:id/image", get(resumes::handle_get_image))
        .route("/api/v1/data", delete(resumes::handle_wipe))
        // Onboarding
        .route(
            "/api/v1/onboarding",
            get(onboarding::handle_get)
                .put(onboarding::handle_complete)
                .delete(onboarding::handle_reset),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
