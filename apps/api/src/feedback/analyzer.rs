//! Resume Analyzer: asks the model for a review and turns the reply into `Feedback`.

use tracing::info;

use crate::ai::AiClient;
use crate::errors::AppError;
use crate::feedback::models::Feedback;
use crate::feedback::prompts::prepare_instructions;

/// Runs the feedback use case for a stored resume file.
///
/// Exhaustion surfaces as `AppError::AiUnavailable`. A reply that is not valid
/// feedback is `AppError::Analysis`: the request itself succeeded, so it is not
/// retried against other models.
pub async fn analyze_resume(
    ai: &AiClient,
    resume_path: &str,
    job_title: &str,
    job_description: &str,
) -> Result<Feedback, AppError> {
    let instructions = prepare_instructions(job_title, job_description);
    let response = ai.feedback(resume_path, &instructions).await?;
    info!("Feedback received from {}", response.model);
    parse_feedback(&response.text)
}

/// Parses model output into `Feedback`, tolerating markdown code fences.
pub fn parse_feedback(text: &str) -> Result<Feedback, AppError> {
    let feedback: Feedback = serde_json::from_str(strip_json_fences(text))
        .map_err(|e| AppError::Analysis(format!("Feedback is not valid JSON: {e}")))?;

    for (title, category) in feedback.categories() {
        if category.score > 100 {
            return Err(AppError::Analysis(format!(
                "{title} score {} is out of range",
                category.score
            )));
        }
    }
    if feedback.overall_score > 100 {
        return Err(AppError::Analysis(format!(
            "overall score {} is out of range",
            feedback.overall_score
        )));
    }
    Ok(feedback)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
