//! Score bands used to present feedback: badge labels per category and a
//! grade for the overall score.

use serde::Serialize;

use crate::feedback::models::Feedback;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    #[serde(rename = "Strong")]
    Strong,
    #[serde(rename = "Good Start")]
    GoodStart,
    #[serde(rename = "Needs Work")]
    NeedsWork,
}

impl Badge {
    pub fn for_score(score: u32) -> Self {
        match score {
            s if s > 70 => Badge::Strong,
            s if s > 49 => Badge::GoodStart,
            _ => Badge::NeedsWork,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    Outstanding,
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn for_score(score: u32) -> Self {
        match score {
            90.. => Grade::Outstanding,
            80..=89 => Grade::Excellent,
            70..=79 => Grade::VeryGood,
            60..=69 => Grade::Good,
            50..=59 => Grade::Fair,
            _ => Grade::Poor,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub title: &'static str,
    pub score: u32,
    pub badge: Badge,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub overall_score: u32,
    pub grade: Grade,
    pub categories: Vec<CategorySummary>,
}

pub fn summarize(feedback: &Feedback) -> FeedbackSummary {
    FeedbackSummary {
        overall_score: feedback.overall_score,
        grade: Grade::for_score(feedback.overall_score),
        categories: feedback
            .categories()
            .into_iter()
            .map(|(title, category)| CategorySummary {
                title,
                score: category.score,
                badge: Badge::for_score(category.score),
            })
            .collect(),
    }
}
