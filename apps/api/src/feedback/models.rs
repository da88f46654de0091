use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    /// Present on category tips, absent on ATS tips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFeedback {
    #[serde(deserialize_with = "whole_score")]
    pub score: u32,
    #[serde(default)]
    pub tips: Vec<Tip>,
}

/// Full review of one resume against one job. Field names match the JSON the
/// model is instructed to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(deserialize_with = "whole_score")]
    pub overall_score: u32,
    #[serde(rename = "ATS")]
    pub ats: CategoryFeedback,
    pub tone_and_style: CategoryFeedback,
    pub content: CategoryFeedback,
    pub structure: CategoryFeedback,
    pub skills: CategoryFeedback,
}

impl Feedback {
    /// (title, category) for every scored category, in display order.
    pub fn categories(&self) -> [(&'static str, &CategoryFeedback); 5] {
        [
            ("ATS", &self.ats),
            ("Tone & Style", &self.tone_and_style),
            ("Content", &self.content),
            ("Structure", &self.structure),
            ("Skills", &self.skills),
        ]
    }
}

/// Accepts any JSON number and rounds it; models often answer `72.5` or `80.0`.
/// The 0..=100 range is checked by the analyzer.
fn whole_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(D::Error::custom(format!("score {raw} is not a non-negative number")));
    }
    Ok(raw.round().min(u32::MAX as f64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SAMPLE_FEEDBACK_JSON as SAMPLE;

    #[test]
    fn test_feedback_deserializes_camel_case_and_ats() {
        let f: Feedback = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(f.overall_score, 72);
        assert_eq!(f.ats.score, 80);
        assert_eq!(f.ats.tips[0].kind, TipKind::Good);
        assert!(f.ats.tips[0].explanation.is_none());
        assert_eq!(
            f.tone_and_style.tips[0].explanation.as_deref(),
            Some("Synergy appears 4 times.")
        );
    }

    #[test]
    fn test_feedback_serializes_with_wire_field_names() {
        let f: Feedback = serde_json::from_str(SAMPLE).unwrap();
        let json = serde_json::to_value(&f).unwrap();
        assert!(json.get("ATS").is_some());
        assert!(json.get("toneAndStyle").is_some());
        assert!(json["ATS"]["tips"][0].get("explanation").is_none());
    }

    #[test]
    fn test_fractional_scores_are_rounded() {
        let text = SAMPLE
            .replace("\"overallScore\": 72", "\"overallScore\": 72.5")
            .replace("\"score\": 80", "\"score\": 80.0");
        let f: Feedback = serde_json::from_str(&text).unwrap();
        assert_eq!(f.overall_score, 73);
        assert_eq!(f.ats.score, 80);
    }

    #[test]
    fn test_negative_score_is_rejected() {
        let text = SAMPLE.replace("\"score\": 80", "\"score\": -5");
        assert!(serde_json::from_str::<Feedback>(&text).is_err());
    }

    #[test]
    fn test_categories_order() {
        let f: Feedback = serde_json::from_str(SAMPLE).unwrap();
        let titles: Vec<_> = f.categories().iter().map(|(t, _)| *t).collect();
        assert_eq!(titles, vec!["ATS", "Tone & Style", "Content", "Structure", "Skills"]);
    }
}
