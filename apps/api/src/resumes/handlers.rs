//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::extractor::AuthSession;
use crate::errors::AppError;
use crate::feedback::models::Feedback;
use crate::feedback::scoring::{summarize, FeedbackSummary};
use crate::resumes::models::{ResumeRecord, ResumeView};
use crate::resumes::pipeline::{run_upload_pipeline, ResumeUpload, Stage};
use crate::resumes::repository::ResumeRepository;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub status: &'static str,
    pub feedback: Option<Feedback>,
    pub summary: Option<FeedbackSummary>,
}

#[derive(Debug, Serialize)]
pub struct WipeResponse {
    pub deleted: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
///
/// Multipart form: `company-name`, `job-title`, `job-description`, `file`.
/// Runs the whole upload pipeline and returns the feedback.
pub async fn handle_upload(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_upload_form(multipart).await?;
    upload.validate(state.config.max_upload_bytes)?;

    let record = run_upload_pipeline(&state.platform, &session, upload).await?;

    Ok(Json(UploadResponse {
        id: record.id,
        status: Stage::Completed.status(),
        summary: record.feedback.as_ref().map(summarize),
        feedback: record.feedback,
    }))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<Vec<ResumeView>>, AppError> {
    let repo = ResumeRepository::new(&session.kv, state.platform.fs.as_ref());
    let records = repo.list().await?;
    Ok(Json(records.into_iter().map(ResumeView::from).collect()))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeView>, AppError> {
    let record = load_record(&state, &session, id).await?;
    Ok(Json(record.into()))
}

/// DELETE /api/v1/resumes/:id
///
/// Deletes the resume file, the image and the record.
pub async fn handle_delete(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let repo = ResumeRepository::new(&session.kv, state.platform.fs.as_ref());
    if !repo.delete(id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/file
pub async fn handle_get_file(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = load_record(&state, &session, id).await?;
    let bytes = state.platform.fs.read(&record.resume_path).await?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}

/// GET /api/v1/resumes/:id/image
pub async fn handle_get_image(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = load_record(&state, &session, id).await?;
    let bytes = state.platform.fs.read(&record.image_path).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// DELETE /api/v1/data
///
/// Removes every record, file and setting belonging to the caller.
pub async fn handle_wipe(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<WipeResponse>, AppError> {
    let repo = ResumeRepository::new(&session.kv, state.platform.fs.as_ref());
    let deleted = repo.wipe().await?;
    Ok(Json(WipeResponse { deleted }))
}

async fn load_record(
    state: &AppState,
    session: &crate::platform::UserSession,
    id: Uuid,
) -> Result<ResumeRecord, AppError> {
    ResumeRepository::new(&session.kv, state.platform.fs.as_ref())
        .load(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

async fn read_upload_form(mut multipart: Multipart) -> Result<ResumeUpload, AppError> {
    let mut upload = ResumeUpload {
        company_name: String::new(),
        job_title: String::new(),
        job_description: String::new(),
        file_name: "resume.pdf".to_string(),
        content_type: None,
        bytes: Bytes::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if let Some(file_name) = field.file_name().filter(|n| !n.is_empty()) {
                    upload.file_name = file_name.to_string();
                }
                upload.content_type = field.content_type().map(str::to_string);
                upload.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file upload: {e}")))?;
            }
            "company-name" | "job-title" | "job-description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid form field {name}: {e}")))?;
                match name.as_str() {
                    "company-name" => upload.company_name = value,
                    "job-title" => upload.job_title = value,
                    _ => upload.job_description = value,
                }
            }
            _ => {}
        }
    }

    Ok(upload)
}
