//! Upload pipeline: store the PDF, render its first page, store the image,
//! record the job details, analyze, record the feedback.
//!
//! Any failing stage halts the pipeline; nothing after it runs.

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::analyzer::analyze_resume;
use crate::platform::{PlatformContext, PlatformError, UserSession};
use crate::resumes::models::ResumeRecord;
use crate::resumes::repository::ResumeRepository;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Pipeline stages, each with the status shown while it runs and the message
/// shown if it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    UploadingResume,
    ConvertingToImage,
    UploadingImage,
    PreparingData,
    Analyzing,
    Completed,
}

impl Stage {
    pub fn status(self) -> &'static str {
        match self {
            Stage::UploadingResume => "Uploading resume...",
            Stage::ConvertingToImage => "Converting to image...",
            Stage::UploadingImage => "Uploading the image...",
            Stage::PreparingData => "Preparing data...",
            Stage::Analyzing => "Analyzing...",
            Stage::Completed => "Analysis completed",
        }
    }

    pub fn failure(self) -> &'static str {
        match self {
            Stage::UploadingResume => "Failed to upload file",
            Stage::ConvertingToImage => "Failed to convert PDF to Image",
            Stage::UploadingImage => "Failed to upload image",
            Stage::PreparingData => "Failed to prepare data",
            Stage::Analyzing | Stage::Completed => "Failed to analyze resume",
        }
    }

    fn fail(self, source: PlatformError) -> AppError {
        AppError::Stage {
            status: self.failure(),
            source,
        }
    }
}

/// A submitted resume plus the job it targets.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeUpload {
    pub fn validate(&self, max_bytes: usize) -> Result<(), AppError> {
        if self.job_title.trim().is_empty() {
            return Err(AppError::Validation("job title cannot be empty".to_string()));
        }
        if self.job_description.trim().is_empty() {
            return Err(AppError::Validation(
                "job description cannot be empty".to_string(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(AppError::Validation("a resume file is required".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "resume file exceeds {max_bytes} bytes"
            )));
        }
        let declared_pdf = self.content_type.as_deref() == Some("application/pdf");
        if !declared_pdf && !self.bytes.starts_with(PDF_MAGIC) {
            return Err(AppError::Validation("resume must be a PDF".to_string()));
        }
        Ok(())
    }
}

/// Runs the full pipeline for one upload and returns the analyzed record.
///
/// The record is persisted with empty feedback before analysis starts, so a
/// failed analysis leaves a pending record the user can delete or retry.
pub async fn run_upload_pipeline(
    platform: &PlatformContext,
    session: &UserSession,
    upload: ResumeUpload,
) -> Result<ResumeRecord, AppError> {
    let id = Uuid::new_v4();
    let dir = format!("resumes/{}", session.user.uuid);
    let repo = ResumeRepository::new(&session.kv, platform.fs.as_ref());

    let mut stage = Stage::UploadingResume;
    info!("[resume {id}] {}", stage.status());
    let resume_file = platform
        .fs
        .upload(&dir, &upload.file_name, "application/pdf", upload.bytes.clone())
        .await
        .map_err(|e| stage.fail(e))?;

    stage = Stage::ConvertingToImage;
    info!("[resume {id}] {}", stage.status());
    let image = match platform
        .pdf
        .first_page_png(&upload.file_name, upload.bytes)
        .await
    {
        Ok(image) => image,
        Err(e) => {
            discard_files(platform, id, &[resume_file.path.as_str()]).await;
            return Err(stage.fail(e));
        }
    };

    stage = Stage::UploadingImage;
    info!("[resume {id}] {}", stage.status());
    let image_file = match platform
        .fs
        .upload(&dir, &image.file_name, "image/png", image.bytes)
        .await
    {
        Ok(file) => file,
        Err(e) => {
            discard_files(platform, id, &[resume_file.path.as_str()]).await;
            return Err(stage.fail(e));
        }
    };

    stage = Stage::PreparingData;
    info!("[resume {id}] {}", stage.status());
    let mut record = ResumeRecord {
        id,
        resume_path: resume_file.path,
        image_path: image_file.path,
        company_name: upload.company_name.trim().to_string(),
        job_title: upload.job_title.trim().to_string(),
        job_description: upload.job_description.trim().to_string(),
        feedback: None,
        created_at: Some(Utc::now()),
    };
    if let Err(e) = repo.save(&record).await {
        let uploaded = [record.resume_path.as_str(), record.image_path.as_str()];
        discard_files(platform, id, &uploaded).await;
        return Err(stage.fail(e));
    }

    stage = Stage::Analyzing;
    info!("[resume {id}] {}", stage.status());
    let feedback = analyze_resume(
        &platform.ai,
        &record.resume_path,
        &record.job_title,
        &record.job_description,
    )
    .await
    .inspect_err(|e| warn!("[resume {id}] analysis failed: {e}"))?;

    record.feedback = Some(feedback);
    repo.save(&record).await.map_err(|e| stage.fail(e))?;
    info!("[resume {id}] {}", Stage::Completed.status());

    Ok(record)
}

/// Removes files stored by earlier stages once a later stage has failed and
/// no record will reference them. Removal failures are logged, not returned.
async fn discard_files(platform: &PlatformContext, id: Uuid, paths: &[&str]) {
    for path in paths {
        if let Err(e) = platform.fs.delete(path).await {
            warn!("[resume {id}] could not remove {path}: {e}");
        }
    }
}
