use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::feedback::models::Feedback;
use crate::feedback::scoring::{summarize, FeedbackSummary};

pub const RESUME_KEY_PATTERN: &str = "resume:*";

pub fn resume_key(id: Uuid) -> String {
    format!("resume:{id}")
}

/// One analyzed (or pending) resume, stored as JSON under `resume:<uuid>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    #[serde(default)]
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    /// `None` until analysis completes. Stored as `null`; an empty string is
    /// accepted on read.
    #[serde(default, deserialize_with = "feedback_or_empty")]
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ResumeRecord {
    pub fn is_analyzed(&self) -> bool {
        self.feedback.is_some()
    }

    /// Both stored files are referenced.
    pub fn has_files(&self) -> bool {
        !self.resume_path.is_empty() && !self.image_path.is_empty()
    }
}

fn feedback_or_empty<'de, D>(deserializer: D) -> Result<Option<Feedback>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(D::Error::custom),
    }
}

/// A record as returned by the API, with presentation bands attached.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeView {
    #[serde(flatten)]
    pub record: ResumeRecord,
    pub summary: Option<FeedbackSummary>,
}

impl From<ResumeRecord> for ResumeView {
    fn from(record: ResumeRecord) -> Self {
        let summary = record.feedback.as_ref().map(summarize);
        Self { record, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SAMPLE_FEEDBACK_JSON;

    fn pending_json(feedback: &str) -> String {
        format!(
            r#"{{"id":"6f1c1a5e-8d3f-4f57-9a55-0d6f7f1b2c3d","resumePath":"r/a.pdf",
                "imagePath":"r/a.png","companyName":"Acme","jobTitle":"Engineer",
                "jobDescription":"Rust","feedback":{feedback}}}"#
        )
    }

    #[test]
    fn test_empty_string_feedback_is_pending() {
        let record: ResumeRecord = serde_json::from_str(&pending_json(r#""""#)).unwrap();
        assert!(!record.is_analyzed());
        assert!(record.has_files());
        assert!(record.created_at.is_none());
    }

    #[test]
    fn test_null_feedback_is_pending() {
        let record: ResumeRecord = serde_json::from_str(&pending_json("null")).unwrap();
        assert!(record.feedback.is_none());
    }

    #[test]
    fn test_feedback_object_is_parsed() {
        let record: ResumeRecord =
            serde_json::from_str(&pending_json(SAMPLE_FEEDBACK_JSON)).unwrap();
        assert_eq!(record.feedback.unwrap().overall_score, 72);
    }

    #[test]
    fn test_garbage_feedback_is_an_error() {
        assert!(serde_json::from_str::<ResumeRecord>(&pending_json("42")).is_err());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record: ResumeRecord = serde_json::from_str(&pending_json("null")).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["resumePath"], "r/a.pdf");
        assert_eq!(json["companyName"], "Acme");
        assert!(json["feedback"].is_null());
    }

    #[test]
    fn test_view_includes_summary_when_analyzed() {
        let record: ResumeRecord =
            serde_json::from_str(&pending_json(SAMPLE_FEEDBACK_JSON)).unwrap();
        let json = serde_json::to_value(ResumeView::from(record)).unwrap();
        assert_eq!(json["jobTitle"], "Engineer");
        assert_eq!(json["summary"]["grade"], "Very Good");
    }

    #[test]
    fn test_resume_key() {
        let id = Uuid::nil();
        assert_eq!(
            resume_key(id),
            "resume:00000000-0000-0000-0000-000000000000"
        );
    }
}
