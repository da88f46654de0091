// Resume analysis prompt.

/// Shape the model must return. Kept in sync with `feedback::models::Feedback`.
pub const FEEDBACK_RESPONSE_FORMAT: &str = r#"interface Feedback {
  overallScore: number; // max 100
  ATS: {
    score: number; // rate based on ATS suitability
    tips: { type: "good" | "improve"; tip: string }[]; // 3-4 tips
  };
  toneAndStyle: {
    score: number; // max 100
    tips: { type: "good" | "improve"; tip: string; explanation: string }[]; // 3-4 tips
  };
  content: {
    score: number; // max 100
    tips: { type: "good" | "improve"; tip: string; explanation: string }[]; // 3-4 tips
  };
  structure: {
    score: number; // max 100
    tips: { type: "good" | "improve"; tip: string; explanation: string }[]; // 3-4 tips
  };
  skills: {
    score: number; // max 100
    tips: { type: "good" | "improve"; tip: string; explanation: string }[]; // 3-4 tips
  };
}"#;

const FEEDBACK_INSTRUCTIONS_TEMPLATE: &str = "\
You are an expert in ATS (Applicant Tracking System) and resume analysis. \
Please analyze and rate this resume and suggest how to improve it. \
The rating can be low if the resume is bad. \
Be thorough and detailed. Don't be afraid to point out any mistakes or areas for improvement. \
If there is a lot to improve, don't hesitate to give low scores. This is to help the user improve their resume. \
If available, use the job description for the job the user is applying to for more detailed feedback. \
The job title is: {job_title}\n\
The job description is: {job_description}\n\
Provide the feedback using the following format:\n\
{response_format}\n\
Return the analysis as a JSON object, without any other text and without the backticks. \
Do not include any other text or comments.";

/// Builds the instruction text sent alongside the resume file.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    FEEDBACK_INSTRUCTIONS_TEMPLATE
        .replace("{job_title}", job_title.trim())
        .replace("{job_description}", job_description.trim())
        .replace("{response_format}", FEEDBACK_RESPONSE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_include_job_and_format() {
        let text = prepare_instructions("  Backend Engineer ", "Rust, Postgres");
        assert!(text.contains("The job title is: Backend Engineer\n"));
        assert!(text.contains("The job description is: Rust, Postgres"));
        assert!(text.contains("overallScore"));
        assert!(!text.contains("{job_title}"));
        assert!(!text.contains("{response_format}"));
    }
}
