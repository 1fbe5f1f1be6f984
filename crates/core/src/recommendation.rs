//! Exercise recommendations returned by the `recommend` mode.

use serde::{Deserialize, Serialize};

/// Upper bound of `priority_score`.
pub const MAX_PRIORITY_SCORE: u8 = 100;

/// A single recommended exercise.
///
/// `exercise_id` always resolves against the exercise catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub exercise_id: String,
    pub title: String,
    /// 0..=100, higher first.
    pub priority_score: u8,
    pub reasoning: String,
    pub personalization: String,
    pub expected_benefit: String,
    #[serde(rename = "isAIPowered")]
    pub is_ai_powered: bool,
}

/// The recommend payload: items plus optional model commentary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_focus_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_note: Option<String>,
}

impl RecommendationSet {
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    pub fn exercise_ids(&self) -> impl Iterator<Item = &str> {
        self.recommendations.iter().map(|r| r.exercise_id.as_str())
    }
}
