//! Strict validation of model output.
//!
//! The top-level JSON object must parse as-is; nothing is repaired. Within
//! it, each recommendation is judged on its own and bad items are dropped,
//! never patched. Titles come from the catalog, not from the model.

use habitcoach_core::catalog::ExerciseCatalog;
use habitcoach_core::error::SchemaError;
use habitcoach_core::recommendation::{MAX_PRIORITY_SCORE, Recommendation, RecommendationSet};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Validated recommendations and how many items were discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecommendations {
    pub set: RecommendationSet,
    pub dropped: usize,
}

pub struct ResponseValidator {
    catalog: Arc<ExerciseCatalog>,
}

impl ResponseValidator {
    pub fn new(catalog: Arc<ExerciseCatalog>) -> Self {
        Self { catalog }
    }

    pub fn validate_recommendations(
        &self,
        raw: &str,
        requested: usize,
    ) -> Result<ValidatedRecommendations, SchemaError> {
        let root: Value = serde_json::from_str(raw.trim())
            .map_err(|e| SchemaError::MalformedJson(e.to_string()))?;
        let object = root
            .as_object()
            .ok_or_else(|| SchemaError::MalformedJson("top level is not an object".into()))?;
        let items = object
            .get("recommendations")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::MalformedJson("missing `recommendations` array".into()))?;

        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(items.len());
        let mut dropped = 0;

        for (i, item) in items.iter().enumerate() {
            match self.map_item(item) {
                Ok(rec) if seen.insert(rec.exercise_id.clone()) => kept.push(rec),
                Ok(rec) => {
                    debug!(index = i, exercise_id = %rec.exercise_id, "Dropping duplicate recommendation");
                    dropped += 1;
                }
                Err(reason) => {
                    debug!(index = i, reason, "Dropping invalid recommendation");
                    dropped += 1;
                }
            }
        }

        kept.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
        if kept.len() > requested {
            dropped += kept.len() - requested;
            kept.truncate(requested);
        }

        if kept.is_empty() {
            return Err(SchemaError::NoValidItems { dropped });
        }
        if dropped > 0 {
            warn!(kept = kept.len(), dropped, "Model output contained invalid recommendations");
        }

        Ok(ValidatedRecommendations {
            set: RecommendationSet {
                recommendations: kept,
                overall_focus_theme: optional_text(object.get("overall_focus_theme")),
                coach_note: optional_text(object.get("coach_note")),
            },
            dropped,
        })
    }

    /// Free-text replies only need to be non-blank.
    pub fn validate_text(&self, raw: &str) -> Result<String, SchemaError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(SchemaError::EmptyText);
        }
        Ok(text.to_string())
    }

    fn map_item(&self, item: &Value) -> Result<Recommendation, &'static str> {
        let id = required_text(item, "exercise_id")?;
        let exercise = self.catalog.get(id).ok_or("exercise_id not in catalog")?;

        let score = item
            .get("priority_score")
            .and_then(Value::as_f64)
            .ok_or("priority_score missing or not a number")?;
        if !(0.0..=f64::from(MAX_PRIORITY_SCORE)).contains(&score) {
            return Err("priority_score out of range");
        }

        Ok(Recommendation {
            exercise_id: exercise.id.clone(),
            title: exercise.title.clone(),
            priority_score: score.round() as u8,
            reasoning: required_text(item, "reasoning")?.to_string(),
            personalization: required_text(item, "personalization")?.to_string(),
            expected_benefit: required_text(item, "expected_benefit")?.to_string(),
            is_ai_powered: true,
        })
    }
}

fn required_text<'a>(item: &'a Value, field: &'static str) -> Result<&'a str, &'static str> {
    match item.get(field).and_then(Value::as_str).map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(field),
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> ResponseValidator {
        ResponseValidator::new(Arc::new(ExerciseCatalog::builtin()))
    }

    fn item(id: &str, score: Value) -> Value {
        json!({
            "exercise_id": id,
            "priority_score": score,
            "reasoning": "You logged stress twice this week",
            "personalization": "Do it before your 9am standup",
            "expected_benefit": "Calmer start"
        })
    }

    #[test]
    fn three_valid_items_pass_through() {
        let raw = json!({
            "recommendations": [item("box-breathing", json!(90)), item("brisk-walk", json!(70)), item("weekly-review", json!(80))],
            "overall_focus_theme": "Calm mornings",
            "coach_note": "No excuses this week."
        })
        .to_string();
        let out = validator().validate_recommendations(&raw, 3).unwrap();
        assert_eq!(out.set.len(), 3);
        assert_eq!(out.dropped, 0);
        assert!(out.set.recommendations.iter().all(|r| r.is_ai_powered));
        assert_eq!(out.set.recommendations[0].title, "Box Breathing");
        assert_eq!(out.set.recommendations[1].exercise_id, "weekly-review");
        assert_eq!(out.set.overall_focus_theme.as_deref(), Some("Calm mornings"));
    }

    #[test]
    fn unknown_ids_never_pass() {
        let raw = json!({
            "recommendations": [item("box-breathing", json!(50)), item("cold-plunge", json!(99))]
        })
        .to_string();
        let out = validator().validate_recommendations(&raw, 3).unwrap();
        let ids: Vec<_> = out.set.exercise_ids().collect();
        assert_eq!(ids, vec!["box-breathing"]);
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn bad_scores_blanks_and_duplicates_dropped() {
        let mut blank = item("desk-stretch", json!(40));
        blank["reasoning"] = json!("   ");
        let raw = json!({
            "recommendations": [
                item("body-scan", json!(101)),
                item("five-senses", json!(-1)),
                item("478-breathing", json!("high")),
                blank,
                item("brisk-walk", json!(60)),
                item("brisk-walk", json!(65)),
            ]
        })
        .to_string();
        let out = validator().validate_recommendations(&raw, 5).unwrap();
        assert_eq!(out.set.len(), 1);
        assert_eq!(out.set.recommendations[0].priority_score, 60);
        assert_eq!(out.dropped, 5);
    }

    #[test]
    fn truncated_to_requested_count() {
        let raw = json!({
            "recommendations": [item("box-breathing", json!(10)), item("brisk-walk", json!(90)), item("body-scan", json!(50))]
        })
        .to_string();
        let out = validator().validate_recommendations(&raw, 2).unwrap();
        let ids: Vec<_> = out.set.exercise_ids().collect();
        assert_eq!(ids, vec!["brisk-walk", "body-scan"]);
    }

    #[test]
    fn malformed_json_is_a_schema_error() {
        let v = validator();
        assert!(matches!(
            v.validate_recommendations("Sure! Here are some ideas: {", 3),
            Err(SchemaError::MalformedJson(_))
        ));
        assert!(matches!(
            v.validate_recommendations("```json\n{\"recommendations\": []}\n```", 3),
            Err(SchemaError::MalformedJson(_))
        ));
        assert!(matches!(
            v.validate_recommendations("[1,2,3]", 3),
            Err(SchemaError::MalformedJson(_))
        ));
    }

    #[test]
    fn no_surviving_items_is_a_schema_error() {
        let raw = json!({ "recommendations": [item("cold-plunge", json!(50))] }).to_string();
        assert_eq!(
            validator().validate_recommendations(&raw, 3),
            Err(SchemaError::NoValidItems { dropped: 1 })
        );
    }

    #[test]
    fn text_must_not_be_blank() {
        let v = validator();
        assert_eq!(v.validate_text("  Do it now.  ").unwrap(), "Do it now.");
        assert_eq!(v.validate_text(" \n "), Err(SchemaError::EmptyText));
    }
}
