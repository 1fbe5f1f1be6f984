//! Context aggregation: the fan-out/fan-in that builds a [`UserContextSnapshot`].
//!
//! Every source is read concurrently and independently. A source that
//! errors or exceeds its timeout leaves its field empty and is recorded in
//! `degraded_sources`; the aggregator itself never fails. Windows and caps
//! come from [`ContextLimits`] and are applied twice: once in the store
//! query and again after it returns, so a misbehaving store cannot inflate
//! the prompt.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use habitcoach_config::ContextLimits;
use habitcoach_core::error::StoreError;
use habitcoach_core::message::recent_window;
use habitcoach_core::snapshot::{GoalHorizon, JournalSignal, SourceKind, UserContextSnapshot};
use habitcoach_core::store::{JournalEntry, UserDataStore};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Gathers a bounded snapshot of one user's recent state.
pub struct ContextAggregator {
    store: Arc<dyn UserDataStore>,
    limits: ContextLimits,
}

impl ContextAggregator {
    pub fn new(store: Arc<dyn UserDataStore>, limits: ContextLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &ContextLimits {
        &self.limits
    }

    /// Build a snapshot as of now.
    pub async fn gather(&self, user_id: &str) -> UserContextSnapshot {
        self.gather_at(user_id, Utc::now()).await
    }

    /// Build a snapshot with windows measured back from `now`.
    pub async fn gather_at(&self, user_id: &str, now: DateTime<Utc>) -> UserContextSnapshot {
        let l = &self.limits;
        let mood_since = now - ChronoDuration::days(l.mood_days);
        let journal_since = now - ChronoDuration::days(l.journal_days);
        let exercise_since = now - ChronoDuration::days(l.exercise_days);

        let (weekly, long_term, moods, journal, exercises, turns, favorites) = futures::join!(
            self.read(
                SourceKind::WeeklyGoals,
                self.store.recent_goals(user_id, GoalHorizon::Weekly, l.weekly_goals),
            ),
            self.read(
                SourceKind::LongTermGoals,
                self.store.recent_goals(user_id, GoalHorizon::LongTerm, l.long_term_goals),
            ),
            self.read(
                SourceKind::Mood,
                self.store.mood_logs(user_id, mood_since, l.mood_limit),
            ),
            self.read(
                SourceKind::Journal,
                self.store.journal_entries(user_id, journal_since, l.journal_limit),
            ),
            self.read(
                SourceKind::ExerciseHistory,
                self.store.exercise_completions(user_id, exercise_since, l.exercise_limit),
            ),
            self.read(
                SourceKind::Conversation,
                self.store.conversation_turns(user_id, l.conversation_turns),
            ),
            self.read(SourceKind::Favorites, self.store.favorites(user_id)),
        );

        let mut degraded = BTreeSet::new();
        let mut snapshot = UserContextSnapshot::empty(user_id);

        let mut weekly = settle(SourceKind::WeeklyGoals, weekly, &mut degraded);
        weekly.retain(|g| g.horizon == GoalHorizon::Weekly);
        weekly.truncate(l.weekly_goals);
        let mut long_term = settle(SourceKind::LongTermGoals, long_term, &mut degraded);
        long_term.retain(|g| g.horizon == GoalHorizon::LongTerm);
        long_term.truncate(l.long_term_goals);
        snapshot.goals = weekly;
        snapshot.goals.extend(long_term);

        snapshot.mood_signals = settle(SourceKind::Mood, moods, &mut degraded);
        snapshot.mood_signals.retain(|m| m.created_at >= mood_since);
        snapshot.mood_signals.truncate(l.mood_limit);

        snapshot.journal_signals = settle(SourceKind::Journal, journal, &mut degraded)
            .into_iter()
            .filter(|j| j.created_at >= journal_since)
            .take(l.journal_limit)
            .filter_map(|j| journal_signal(j, l.journal_excerpt_chars))
            .collect();

        snapshot.exercise_history = settle(SourceKind::ExerciseHistory, exercises, &mut degraded);
        snapshot.exercise_history.retain(|e| e.completed_at >= exercise_since);
        snapshot.exercise_history.truncate(l.exercise_limit);

        let turns = settle(SourceKind::Conversation, turns, &mut degraded);
        snapshot.conversation_window = recent_window(&turns, l.conversation_turns);

        snapshot.favorites = settle(SourceKind::Favorites, favorites, &mut degraded)
            .into_iter()
            .collect();

        snapshot.degraded_sources = degraded;

        debug!(
            user = %user_id,
            goals = snapshot.goals.len(),
            moods = snapshot.mood_signals.len(),
            journal = snapshot.journal_signals.len(),
            exercises = snapshot.exercise_history.len(),
            turns = snapshot.conversation_window.len(),
            favorites = snapshot.favorites.len(),
            degraded = snapshot.degraded_sources.len(),
            "Context snapshot gathered"
        );

        snapshot
    }

    /// Run one source read under the per-source timeout.
    async fn read<T>(
        &self,
        source: SourceKind,
        read: impl Future<Output = Result<Vec<T>, StoreError>>,
    ) -> Option<Vec<T>> {
        let timeout = Duration::from_millis(self.limits.source_timeout_ms);
        match tokio::time::timeout(timeout, read).await {
            Ok(Ok(items)) => Some(items),
            Ok(Err(e)) => {
                warn!(source = %source, error = %e, "Context source failed; continuing without it");
                None
            }
            Err(_) => {
                warn!(
                    source = %source,
                    timeout_ms = self.limits.source_timeout_ms,
                    "Context source timed out; continuing without it"
                );
                None
            }
        }
    }
}

fn settle<T>(source: SourceKind, read: Option<Vec<T>>, degraded: &mut BTreeSet<SourceKind>) -> Vec<T> {
    read.unwrap_or_else(|| {
        degraded.insert(source);
        Vec::new()
    })
}

/// Prefer the stored insight over the raw body; skip entries with neither.
fn journal_signal(entry: JournalEntry, max_chars: usize) -> Option<JournalSignal> {
    let text = entry
        .insight
        .filter(|i| !i.trim().is_empty())
        .unwrap_or(entry.body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(JournalSignal {
        excerpt: excerpt(text, max_chars),
        created_at: entry.created_at,
    })
}

/// Cut to at most `max_chars` characters, marking the cut with an ellipsis.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}
