//! User data store trait: read access to the app's persisted records.
//!
//! Goals, journal, mood, exercise history, conversation log and favorites
//! are owned by the app's data layer. The coach only reads bounded,
//! time-windowed slices of them. Implementations: in-memory (tests and
//! local development) and SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::StoreError;
use crate::message::ConversationTurn;
use crate::snapshot::{ExerciseRecord, GoalHorizon, GoalSignal, MoodSignal};

/// A raw journal entry as stored by the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub body: String,
    /// A previously extracted insight, preferred over the raw body when present.
    #[serde(default)]
    pub insight: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Read-only access to one user's records.
///
/// Every windowed query returns at most `limit` items, newest first.
#[async_trait]
pub trait UserDataStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    async fn recent_goals(
        &self,
        user_id: &str,
        horizon: GoalHorizon,
        limit: usize,
    ) -> Result<Vec<GoalSignal>, StoreError>;

    async fn mood_logs(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MoodSignal>, StoreError>;

    async fn journal_entries(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    async fn exercise_completions(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ExerciseRecord>, StoreError>;

    async fn conversation_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError>;

    /// Favorite exercise ids.
    async fn favorites(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
}
