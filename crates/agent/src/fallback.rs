//! Deterministic substitutes served when the model cannot be used.

use habitcoach_core::catalog::ExerciseCatalog;
use habitcoach_core::outcome::FallbackReason;
use habitcoach_core::recommendation::{Recommendation, RecommendationSet};
use habitcoach_core::snapshot::UserContextSnapshot;
use std::sync::Arc;

/// Neutral score for favorites served without model ranking.
pub const FALLBACK_PRIORITY: u8 = 50;

pub struct FallbackStrategy {
    catalog: Arc<ExerciseCatalog>,
}

impl FallbackStrategy {
    pub fn new(catalog: Arc<ExerciseCatalog>) -> Self {
        Self { catalog }
    }

    /// The user's favorites, sorted by exercise id, as non-AI recommendations.
    /// Favorites that no longer exist in the catalog are skipped.
    pub fn recommend(&self, snapshot: &UserContextSnapshot, count: usize, reason: FallbackReason) -> RecommendationSet {
        let recommendations: Vec<Recommendation> = snapshot
            .favorites
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .take(count)
            .map(|exercise| Recommendation {
                exercise_id: exercise.id.clone(),
                title: exercise.title.clone(),
                priority_score: FALLBACK_PRIORITY,
                reasoning: "One of your saved favorites.".into(),
                personalization: format!("Take {} minutes for it today.", exercise.default_duration_minutes),
                expected_benefit: exercise.benefit.clone(),
                is_ai_powered: false,
            })
            .collect();

        let coach_note = if recommendations.is_empty() {
            "Personalized picks are unavailable right now. Save a few favorites and they will show up here."
        } else {
            "Personalized picks are unavailable right now, so here are your favorites."
        };

        tracing::debug!(reason = %reason, count = recommendations.len(), "Serving favorites fallback");

        RecommendationSet {
            recommendations,
            overall_focus_theme: None,
            coach_note: Some(coach_note.to_string()),
        }
    }

    pub fn converse(&self, reason: FallbackReason) -> String {
        match reason {
            FallbackReason::BudgetExhausted => {
                "You're out of coaching tokens for now. Top up to keep the conversation going.".into()
            }
            FallbackReason::Timeout => {
                "Your coach is taking too long to answer. Please try again in a moment.".into()
            }
            FallbackReason::ProviderError | FallbackReason::SchemaError => {
                "Your coach is unavailable right now. Please try again shortly.".into()
            }
        }
    }

    pub fn analyze(&self, reason: FallbackReason) -> String {
        match reason {
            FallbackReason::BudgetExhausted => {
                "You're out of coaching tokens, so this analysis couldn't run. Top up and try again.".into()
            }
            FallbackReason::Timeout => "The analysis took too long. Please try again in a moment.".into(),
            FallbackReason::ProviderError | FallbackReason::SchemaError => {
                "Analysis is unavailable right now. Please try again shortly.".into()
            }
        }
    }
}
