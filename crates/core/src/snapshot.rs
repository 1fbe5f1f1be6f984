//! The per-request user context snapshot.
//!
//! Built fresh for every request from several independent data sources,
//! never persisted. Each field is independently optional: a failing source
//! leaves its field empty and is listed in `degraded_sources`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::message::ConversationTurn;

/// Whether a goal is a weekly goal or a long-term one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalHorizon {
    Weekly,
    LongTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSignal {
    pub text: String,
    pub status: GoalStatus,
    pub horizon: GoalHorizon,
    /// Where the goal came from ("user", "coach", "onboarding", ...)
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodSignal {
    pub label: String,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalSignal {
    /// Stored insight if the entry has one, otherwise an excerpt of the body.
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub exercise_id: String,
    pub kind: String,
    pub completed_at: DateTime<Utc>,
}

/// Names of the snapshot's data sources, used in logs and degradation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    WeeklyGoals,
    LongTermGoals,
    Mood,
    Journal,
    ExerciseHistory,
    Conversation,
    Favorites,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::WeeklyGoals => "weekly_goals",
            Self::LongTermGoals => "long_term_goals",
            Self::Mood => "mood",
            Self::Journal => "journal",
            Self::ExerciseHistory => "exercise_history",
            Self::Conversation => "conversation",
            Self::Favorites => "favorites",
        };
        f.write_str(name)
    }
}

/// Bounded, immutable aggregation of a user's recent state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContextSnapshot {
    pub user_id: String,
    pub goals: Vec<GoalSignal>,
    pub mood_signals: Vec<MoodSignal>,
    pub journal_signals: Vec<JournalSignal>,
    pub exercise_history: Vec<ExerciseRecord>,
    pub conversation_window: Vec<ConversationTurn>,
    pub favorites: BTreeSet<String>,
    /// Sources that failed or timed out while gathering.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub degraded_sources: BTreeSet<SourceKind>,
}

impl UserContextSnapshot {
    /// An empty snapshot for a user (every source empty).
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Goals of one horizon, in stored order.
    pub fn goals_for(&self, horizon: GoalHorizon) -> impl Iterator<Item = &GoalSignal> {
        self.goals.iter().filter(move |g| g.horizon == horizon)
    }

    /// Whether every source came back empty.
    pub fn is_blank(&self) -> bool {
        self.goals.is_empty()
            && self.mood_signals.is_empty()
            && self.journal_signals.is_empty()
            && self.exercise_history.is_empty()
            && self.conversation_window.is_empty()
            && self.favorites.is_empty()
    }
}
