//! In-memory backends: useful for testing and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use habitcoach_core::error::{LedgerError, StoreError};
use habitcoach_core::ledger::{OverdraftPolicy, TokenLedger};
use habitcoach_core::message::ConversationTurn;
use habitcoach_core::snapshot::{ExerciseRecord, GoalHorizon, GoalSignal, MoodSignal};
use habitcoach_core::store::{JournalEntry, UserDataStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Everything the app has stored for one user.
#[derive(Debug, Clone, Default)]
pub struct UserRecords {
    pub goals: Vec<GoalSignal>,
    pub moods: Vec<MoodSignal>,
    pub journal: Vec<JournalEntry>,
    pub exercises: Vec<ExerciseRecord>,
    pub turns: Vec<ConversationTurn>,
    pub favorites: Vec<String>,
}

/// A user data store backed by a map of [`UserRecords`].
pub struct InMemoryStore {
    users: Arc<RwLock<HashMap<String, UserRecords>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replace all records for a user.
    pub async fn insert_user(&self, user_id: impl Into<String>, records: UserRecords) {
        self.users.write().await.insert(user_id.into(), records);
    }

    pub async fn add_turn(&self, user_id: &str, turn: ConversationTurn) {
        self.users
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .turns
            .push(turn);
    }

    async fn read<T>(&self, user_id: &str, f: impl FnOnce(&UserRecords) -> T) -> Option<T> {
        self.users.read().await.get(user_id).map(f)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest first, limited.
fn newest<T: Clone>(
    items: &[T],
    at: impl Fn(&T) -> DateTime<Utc>,
    keep: impl Fn(&T) -> bool,
    limit: usize,
) -> Vec<T> {
    let mut out: Vec<T> = items.iter().filter(|i| keep(i)).cloned().collect();
    out.sort_by_key(|i| std::cmp::Reverse(at(i)));
    out.truncate(limit);
    out
}

#[async_trait]
impl UserDataStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn recent_goals(
        &self,
        user_id: &str,
        horizon: GoalHorizon,
        limit: usize,
    ) -> Result<Vec<GoalSignal>, StoreError> {
        Ok(self
            .read(user_id, |r| newest(&r.goals, |g| g.created_at, |g| g.horizon == horizon, limit))
            .await
            .unwrap_or_default())
    }

    async fn mood_logs(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MoodSignal>, StoreError> {
        Ok(self
            .read(user_id, |r| newest(&r.moods, |m| m.created_at, |m| m.created_at >= since, limit))
            .await
            .unwrap_or_default())
    }

    async fn journal_entries(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        Ok(self
            .read(user_id, |r| newest(&r.journal, |j| j.created_at, |j| j.created_at >= since, limit))
            .await
            .unwrap_or_default())
    }

    async fn exercise_completions(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ExerciseRecord>, StoreError> {
        Ok(self
            .read(user_id, |r| {
                newest(&r.exercises, |e| e.completed_at, |e| e.completed_at >= since, limit)
            })
            .await
            .unwrap_or_default())
    }

    async fn conversation_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        Ok(self
            .read(user_id, |r| newest(&r.turns, |t| t.created_at, |_| true, limit))
            .await
            .unwrap_or_default())
    }

    async fn favorites(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read(user_id, |r| r.favorites.clone())
            .await
            .unwrap_or_default())
    }
}

/// A token ledger held in process memory.
///
/// Check-and-subtract happens under one mutex acquisition, so concurrent
/// debits for the same user serialize.
pub struct InMemoryLedger {
    balances: Mutex<HashMap<String, u64>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a balance (builder style, for tests and local runs).
    pub fn with_balance(self, user_id: impl Into<String>, balance: u64) -> Self {
        if let Ok(mut balances) = self.balances.lock() {
            balances.insert(user_id.into(), balance);
        }
        self
    }

    /// Add tokens to a user's balance, creating the row if needed.
    pub fn credit(&self, user_id: &str, amount: u64) -> Result<u64, LedgerError> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|e| LedgerError::Storage(format!("ledger lock poisoned: {e}")))?;
        let balance = balances.entry(user_id.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);
        Ok(*balance)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenLedger for InMemoryLedger {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn balance(&self, user_id: &str) -> Result<Option<u64>, LedgerError> {
        let balances = self
            .balances
            .lock()
            .map_err(|e| LedgerError::Storage(format!("ledger lock poisoned: {e}")))?;
        Ok(balances.get(user_id).copied())
    }

    async fn debit(
        &self,
        user_id: &str,
        amount: u64,
        policy: OverdraftPolicy,
    ) -> Result<u64, LedgerError> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|e| LedgerError::Storage(format!("ledger lock poisoned: {e}")))?;
        let balance = balances.entry(user_id.to_string()).or_insert(0);

        if amount > *balance && policy == OverdraftPolicy::Reject {
            return Err(LedgerError::InsufficientBalance {
                balance: *balance,
                requested: amount,
            });
        }

        *balance = balance.saturating_sub(amount);
        Ok(*balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use habitcoach_core::snapshot::GoalStatus;

    fn goal(text: &str, horizon: GoalHorizon, age_days: i64) -> GoalSignal {
        GoalSignal {
            text: text.into(),
            status: GoalStatus::Active,
            horizon,
            source: "user".into(),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[tokio::test]
    async fn goals_newest_first_and_limited() {
        let store = InMemoryStore::new();
        store
            .insert_user(
                "u1",
                UserRecords {
                    goals: vec![
                        goal("old", GoalHorizon::Weekly, 10),
                        goal("new", GoalHorizon::Weekly, 1),
                        goal("mid", GoalHorizon::Weekly, 5),
                        goal("dream", GoalHorizon::LongTerm, 2),
                    ],
                    ..Default::default()
                },
            )
            .await;

        let weekly = store.recent_goals("u1", GoalHorizon::Weekly, 2).await.unwrap();
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].text, "new");
        assert_eq!(weekly[1].text, "mid");

        let long = store.recent_goals("u1", GoalHorizon::LongTerm, 3).await.unwrap();
        assert_eq!(long.len(), 1);
    }

    #[tokio::test]
    async fn mood_window_excludes_old_entries() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store
            .insert_user(
                "u1",
                UserRecords {
                    moods: vec![
                        MoodSignal { label: "tired".into(), note: None, created_at: now - Duration::days(9) },
                        MoodSignal { label: "calm".into(), note: None, created_at: now - Duration::days(1) },
                    ],
                    ..Default::default()
                },
            )
            .await;

        let moods = store.mood_logs("u1", now - Duration::days(7), 10).await.unwrap();
        assert_eq!(moods.len(), 1);
        assert_eq!(moods[0].label, "calm");
    }

    #[tokio::test]
    async fn unknown_user_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.favorites("ghost").await.unwrap().is_empty());
        assert!(store.conversation_turns("ghost", 6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn debit_reject_leaves_balance() {
        let ledger = InMemoryLedger::new().with_balance("u1", 50);
        let err = ledger.debit("u1", 100, OverdraftPolicy::Reject).await.unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance { balance: 50, requested: 100 });
        assert_eq!(ledger.balance("u1").await.unwrap(), Some(50));
    }

    #[tokio::test]
    async fn debit_clamp_floors_at_zero() {
        let ledger = InMemoryLedger::new().with_balance("u1", 50);
        assert_eq!(ledger.debit("u1", 100, OverdraftPolicy::Clamp).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn first_debit_creates_row() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance("u1").await.unwrap(), None);
        let _ = ledger.debit("u1", 10, OverdraftPolicy::Clamp).await;
        assert_eq!(ledger.balance("u1").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn concurrent_debits_one_wins_under_reject() {
        let ledger = Arc::new(InMemoryLedger::new().with_balance("u1", 150));
        let a = {
            let l = ledger.clone();
            tokio::spawn(async move { l.debit("u1", 100, OverdraftPolicy::Reject).await })
        };
        let b = {
            let l = ledger.clone();
            tokio::spawn(async move { l.debit("u1", 100, OverdraftPolicy::Reject).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(ledger.balance("u1").await.unwrap(), Some(50));
    }

    #[tokio::test]
    async fn credit_adds() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.credit("u1", 500).unwrap(), 500);
        assert_eq!(ledger.credit("u1", 250).unwrap(), 750);
    }
}
