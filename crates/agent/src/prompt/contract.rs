//! Structured output contracts, stated to the model by example.

use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContract {
    /// A JSON object carrying exactly `count` recommendations.
    RecommendationJson { count: usize },
    /// Plain prose.
    FreeText,
}

impl OutputContract {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::RecommendationJson { .. })
    }

    /// Instruction block appended to the system prompt.
    pub fn instructions(&self) -> String {
        match self {
            Self::RecommendationJson { count } => {
                let example = json!({
                    "recommendations": [{
                        "exercise_id": "<id from the catalog>",
                        "priority_score": 85,
                        "reasoning": "<why this exercise, tied to the user's data>",
                        "personalization": "<how to adapt it to this user today>",
                        "expected_benefit": "<what the user should notice afterwards>"
                    }],
                    "overall_focus_theme": "<one short phrase>",
                    "coach_note": "<one or two sentences in the coach's voice>"
                });
                let example = serde_json::to_string_pretty(&example).unwrap_or_default();
                format!(
                    "## Output format\n\
                     Respond with a single JSON object and nothing else. No markdown, no code fences.\n\
                     The `recommendations` array must contain exactly {count} items.\n\
                     Each `exercise_id` must be copied verbatim from the catalog above.\n\
                     Do not repeat an exercise. `priority_score` is an integer from 0 to 100.\n\
                     Shape:\n{example}"
                )
            }
            Self::FreeText => "## Output format\n\
                 Reply in plain text for a phone screen. No JSON, no headings, at most three short paragraphs."
                .to_string(),
        }
    }
}
