//! SQLite backend for both the user data store and the token ledger.
//!
//! One database file holds the app's records (goals, moods, journal,
//! exercise completions, conversation turns, favorites) and the
//! `token_ledger` table. Timestamps are stored as fixed-width RFC 3339
//! text so lexical order matches chronological order.
//!
//! Debits are single `UPDATE ... RETURNING` statements; the balance check
//! and the subtraction never happen in separate round trips.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use habitcoach_core::error::{LedgerError, StoreError};
use habitcoach_core::ledger::{OverdraftPolicy, TokenLedger};
use habitcoach_core::message::ConversationTurn;
use habitcoach_core::snapshot::{ExerciseRecord, GoalHorizon, GoalSignal, GoalStatus, MoodSignal};
use habitcoach_core::store::{JournalEntry, UserDataStore};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "goals table",
        r#"
        CREATE TABLE IF NOT EXISTS goals (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            text        TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'active',
            horizon     TEXT NOT NULL,
            source      TEXT NOT NULL DEFAULT 'user',
            created_at  TEXT NOT NULL
        )
        "#,
    ),
    (
        "mood_logs table",
        r#"
        CREATE TABLE IF NOT EXISTS mood_logs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            label       TEXT NOT NULL,
            note        TEXT,
            created_at  TEXT NOT NULL
        )
        "#,
    ),
    (
        "journal_entries table",
        r#"
        CREATE TABLE IF NOT EXISTS journal_entries (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            body        TEXT NOT NULL,
            insight     TEXT,
            created_at  TEXT NOT NULL
        )
        "#,
    ),
    (
        "exercise_completions table",
        r#"
        CREATE TABLE IF NOT EXISTS exercise_completions (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id      TEXT NOT NULL,
            exercise_id  TEXT NOT NULL,
            kind         TEXT NOT NULL,
            completed_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "conversation_turns table",
        r#"
        CREATE TABLE IF NOT EXISTS conversation_turns (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            content     TEXT NOT NULL,
            is_user     INTEGER NOT NULL,
            created_at  TEXT NOT NULL
        )
        "#,
    ),
    (
        "favorites table",
        r#"
        CREATE TABLE IF NOT EXISTS favorites (
            user_id      TEXT NOT NULL,
            exercise_id  TEXT NOT NULL,
            PRIMARY KEY (user_id, exercise_id)
        )
        "#,
    ),
    (
        "token_ledger table",
        r#"
        CREATE TABLE IF NOT EXISTS token_ledger (
            user_id     TEXT PRIMARY KEY,
            balance     INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
            updated_at  TEXT NOT NULL
        )
        "#,
    ),
    (
        "goals index",
        "CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id, horizon, created_at DESC)",
    ),
    (
        "mood index",
        "CREATE INDEX IF NOT EXISTS idx_mood_user ON mood_logs(user_id, created_at DESC)",
    ),
    (
        "journal index",
        "CREATE INDEX IF NOT EXISTS idx_journal_user ON journal_entries(user_id, created_at DESC)",
    ),
    (
        "exercise index",
        "CREATE INDEX IF NOT EXISTS idx_exercise_user ON exercise_completions(user_id, completed_at DESC)",
    ),
    (
        "conversation index",
        "CREATE INDEX IF NOT EXISTS idx_turns_user ON conversation_turns(user_id, created_at DESC)",
    ),
];

/// Fixed-width timestamp text.
fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn horizon_str(horizon: GoalHorizon) -> &'static str {
    match horizon {
        GoalHorizon::Weekly => "weekly",
        GoalHorizon::LongTerm => "long_term",
    }
}

fn parse_status(text: &str) -> GoalStatus {
    match text {
        "completed" => GoalStatus::Completed,
        "abandoned" => GoalStatus::Abandoned,
        _ => GoalStatus::Active,
    }
}

fn limit_arg(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn amount_arg(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

fn balance_of(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

fn column<'r, T>(row: &'r sqlx::sqlite::SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| StoreError::QueryFailed(format!("{name} column: {e}")))
}

/// SQLite-backed user data store and token ledger.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Unavailable(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        for (name, sql) in MIGRATIONS {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(format!("{name}: {e}")))?;
        }
        debug!("SQLite migrations complete");
        Ok(())
    }

    // ── Writers (seed data, admin tooling) ────────────────────────────────

    pub async fn insert_goal(&self, user_id: &str, goal: &GoalSignal) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO goals (user_id, text, status, horizon, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(user_id)
        .bind(&goal.text)
        .bind(goal.status.to_string())
        .bind(horizon_str(goal.horizon))
        .bind(&goal.source)
        .bind(ts(goal.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("INSERT goal failed: {e}")))?;
        Ok(())
    }

    pub async fn insert_mood(&self, user_id: &str, mood: &MoodSignal) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO mood_logs (user_id, label, note, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(user_id)
            .bind(&mood.label)
            .bind(&mood.note)
            .bind(ts(mood.created_at))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("INSERT mood failed: {e}")))?;
        Ok(())
    }

    pub async fn insert_journal(&self, user_id: &str, entry: &JournalEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO journal_entries (user_id, body, insight, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(&entry.body)
        .bind(&entry.insight)
        .bind(ts(entry.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("INSERT journal failed: {e}")))?;
        Ok(())
    }

    pub async fn insert_exercise(
        &self,
        user_id: &str,
        record: &ExerciseRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO exercise_completions (user_id, exercise_id, kind, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(&record.exercise_id)
        .bind(&record.kind)
        .bind(ts(record.completed_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("INSERT exercise failed: {e}")))?;
        Ok(())
    }

    pub async fn insert_turn(&self, user_id: &str, turn: &ConversationTurn) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO conversation_turns (user_id, content, is_user, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(&turn.content)
        .bind(turn.is_user)
        .bind(ts(turn.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("INSERT turn failed: {e}")))?;
        Ok(())
    }

    pub async fn add_favorite(&self, user_id: &str, exercise_id: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO favorites (user_id, exercise_id) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(exercise_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("INSERT favorite failed: {e}")))?;
        Ok(())
    }

    /// Add tokens to a user's balance, creating the row if needed.
    pub async fn credit(&self, user_id: &str, amount: u64) -> Result<u64, LedgerError> {
        let row = sqlx::query(
            "INSERT INTO token_ledger (user_id, balance, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                balance = balance + excluded.balance,
                updated_at = excluded.updated_at
             RETURNING balance",
        )
        .bind(user_id)
        .bind(amount_arg(amount))
        .bind(ts(Utc::now()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(format!("credit failed: {e}")))?;

        let balance: i64 = row
            .try_get("balance")
            .map_err(|e| LedgerError::Storage(format!("balance column: {e}")))?;
        Ok(balance_of(balance))
    }

    /// Ensure the ledger row exists, at zero.
    async fn ensure_ledger_row(&self, user_id: &str) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO token_ledger (user_id, balance, updated_at) VALUES (?1, 0, ?2)
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(ts(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(format!("ledger row: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl UserDataStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn recent_goals(
        &self,
        user_id: &str,
        horizon: GoalHorizon,
        limit: usize,
    ) -> Result<Vec<GoalSignal>, StoreError> {
        let rows = sqlx::query(
            "SELECT text, status, source, created_at FROM goals
             WHERE user_id = ?1 AND horizon = ?2
             ORDER BY created_at DESC LIMIT ?3",
        )
        .bind(user_id)
        .bind(horizon_str(horizon))
        .bind(limit_arg(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("goals: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(GoalSignal {
                    text: column(row, "text")?,
                    status: parse_status(&column::<String>(row, "status")?),
                    horizon,
                    source: column(row, "source")?,
                    created_at: parse_ts(&column::<String>(row, "created_at")?),
                })
            })
            .collect()
    }

    async fn mood_logs(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MoodSignal>, StoreError> {
        let rows = sqlx::query(
            "SELECT label, note, created_at FROM mood_logs
             WHERE user_id = ?1 AND created_at >= ?2
             ORDER BY created_at DESC LIMIT ?3",
        )
        .bind(user_id)
        .bind(ts(since))
        .bind(limit_arg(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("mood_logs: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(MoodSignal {
                    label: column(row, "label")?,
                    note: column(row, "note")?,
                    created_at: parse_ts(&column::<String>(row, "created_at")?),
                })
            })
            .collect()
    }

    async fn journal_entries(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT body, insight, created_at FROM journal_entries
             WHERE user_id = ?1 AND created_at >= ?2
             ORDER BY created_at DESC LIMIT ?3",
        )
        .bind(user_id)
        .bind(ts(since))
        .bind(limit_arg(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("journal_entries: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(JournalEntry {
                    body: column(row, "body")?,
                    insight: column(row, "insight")?,
                    created_at: parse_ts(&column::<String>(row, "created_at")?),
                })
            })
            .collect()
    }

    async fn exercise_completions(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ExerciseRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT exercise_id, kind, completed_at FROM exercise_completions
             WHERE user_id = ?1 AND completed_at >= ?2
             ORDER BY completed_at DESC LIMIT ?3",
        )
        .bind(user_id)
        .bind(ts(since))
        .bind(limit_arg(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("exercise_completions: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(ExerciseRecord {
                    exercise_id: column(row, "exercise_id")?,
                    kind: column(row, "kind")?,
                    completed_at: parse_ts(&column::<String>(row, "completed_at")?),
                })
            })
            .collect()
    }

    async fn conversation_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let rows = sqlx::query(
            "SELECT content, is_user, created_at FROM conversation_turns
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit_arg(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("conversation_turns: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(ConversationTurn {
                    content: column(row, "content")?,
                    is_user: column(row, "is_user")?,
                    created_at: parse_ts(&column::<String>(row, "created_at")?),
                })
            })
            .collect()
    }

    async fn favorites(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT exercise_id FROM favorites WHERE user_id = ?1 ORDER BY exercise_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("favorites: {e}")))?;

        rows.iter().map(|row| column(row, "exercise_id")).collect()
    }
}

#[async_trait]
impl TokenLedger for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn balance(&self, user_id: &str) -> Result<Option<u64>, LedgerError> {
        let row = sqlx::query("SELECT balance FROM token_ledger WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::Unavailable(format!("balance query: {e}")))?;

        match row {
            Some(row) => {
                let balance: i64 = row
                    .try_get("balance")
                    .map_err(|e| LedgerError::Storage(format!("balance column: {e}")))?;
                Ok(Some(balance_of(balance)))
            }
            None => Ok(None),
        }
    }

    async fn debit(
        &self,
        user_id: &str,
        amount: u64,
        policy: OverdraftPolicy,
    ) -> Result<u64, LedgerError> {
        self.ensure_ledger_row(user_id).await?;

        let sql = match policy {
            OverdraftPolicy::Reject => {
                "UPDATE token_ledger SET balance = balance - ?2, updated_at = ?3
                 WHERE user_id = ?1 AND balance >= ?2
                 RETURNING balance"
            }
            OverdraftPolicy::Clamp => {
                "UPDATE token_ledger SET balance = MAX(balance - ?2, 0), updated_at = ?3
                 WHERE user_id = ?1
                 RETURNING balance"
            }
        };

        let row = sqlx::query(sql)
            .bind(user_id)
            .bind(amount_arg(amount))
            .bind(ts(Utc::now()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(format!("debit failed: {e}")))?;

        match row {
            Some(row) => {
                let balance: i64 = row
                    .try_get("balance")
                    .map_err(|e| LedgerError::Storage(format!("balance column: {e}")))?;
                debug!(user = %user_id, amount, balance, "Ledger debited");
                Ok(balance_of(balance))
            }
            None => {
                let balance = self.balance(user_id).await?.unwrap_or(0);
                Err(LedgerError::InsufficientBalance {
                    balance,
                    requested: amount,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    async fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coach.db");
        let store = SqliteStore::new(&format!("sqlite://{}", path.display()))
            .await
            .unwrap();
        (store, dir)
    }

    fn goal(text: &str, horizon: GoalHorizon, at: DateTime<Utc>) -> GoalSignal {
        GoalSignal {
            text: text.into(),
            status: GoalStatus::Active,
            horizon,
            source: "user".into(),
            created_at: at,
        }
    }

    #[tokio::test]
    async fn goals_are_bounded_and_newest_first() {
        let (store, _dir) = test_store().await;
        let base = Utc::now() - Duration::days(30);
        for i in 0..8 {
            store
                .insert_goal("u1", &goal(&format!("weekly {i}"), GoalHorizon::Weekly, base + Duration::days(i)))
                .await
                .unwrap();
        }
        store
            .insert_goal("u1", &goal("run a marathon", GoalHorizon::LongTerm, base))
            .await
            .unwrap();

        let weekly = store.recent_goals("u1", GoalHorizon::Weekly, 5).await.unwrap();
        assert_eq!(weekly.len(), 5);
        assert_eq!(weekly[0].text, "weekly 7");
        assert!(weekly.iter().all(|g| g.horizon == GoalHorizon::Weekly));

        let long = store.recent_goals("u1", GoalHorizon::LongTerm, 3).await.unwrap();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].text, "run a marathon");
    }

    #[tokio::test]
    async fn windows_filter_by_time() {
        let (store, _dir) = test_store().await;
        let now = Utc::now();
        store
            .insert_mood("u1", &MoodSignal { label: "anxious".into(), note: None, created_at: now - Duration::days(10) })
            .await
            .unwrap();
        store
            .insert_mood("u1", &MoodSignal { label: "hopeful".into(), note: Some("good day".into()), created_at: now })
            .await
            .unwrap();
        store
            .insert_journal("u1", &JournalEntry { body: "long ago".into(), insight: None, created_at: now - Duration::days(8) })
            .await
            .unwrap();

        let moods = store.mood_logs("u1", now - Duration::days(7), 20).await.unwrap();
        assert_eq!(moods.len(), 1);
        assert_eq!(moods[0].note.as_deref(), Some("good day"));

        let journal = store.journal_entries("u1", now - Duration::days(7), 5).await.unwrap();
        assert!(journal.is_empty());
    }

    #[tokio::test]
    async fn turns_and_favorites_round_trip() {
        let (store, _dir) = test_store().await;
        let base = Utc::now();
        for i in 0..10 {
            let turn = if i % 2 == 0 {
                ConversationTurn::user(format!("u{i}"), base + Duration::seconds(i))
            } else {
                ConversationTurn::coach(format!("c{i}"), base + Duration::seconds(i))
            };
            store.insert_turn("u1", &turn).await.unwrap();
        }
        let turns = store.conversation_turns("u1", 6).await.unwrap();
        assert_eq!(turns.len(), 6);
        assert_eq!(turns[0].content, "c9");
        assert!(!turns[0].is_user);

        store.add_favorite("u1", "box-breathing").await.unwrap();
        store.add_favorite("u1", "box-breathing").await.unwrap();
        store.add_favorite("u1", "brisk-walk").await.unwrap();
        assert_eq!(
            store.favorites("u1").await.unwrap(),
            vec!["box-breathing".to_string(), "brisk-walk".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_ledger_row_is_none() {
        let (store, _dir) = test_store().await;
        assert_eq!(store.balance("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn credit_then_debit() {
        let (store, _dir) = test_store().await;
        assert_eq!(store.credit("u1", 1000).await.unwrap(), 1000);
        assert_eq!(store.debit("u1", 150, OverdraftPolicy::Reject).await.unwrap(), 850);
        assert_eq!(store.balance("u1").await.unwrap(), Some(850));
    }

    #[tokio::test]
    async fn reject_overdraft_leaves_balance() {
        let (store, _dir) = test_store().await;
        store.credit("u1", 50).await.unwrap();
        let err = store.debit("u1", 100, OverdraftPolicy::Reject).await.unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance { balance: 50, requested: 100 });
        assert_eq!(store.balance("u1").await.unwrap(), Some(50));
    }

    #[tokio::test]
    async fn clamp_overdraft_floors_at_zero() {
        let (store, _dir) = test_store().await;
        store.credit("u1", 50).await.unwrap();
        assert_eq!(store.debit("u1", 100, OverdraftPolicy::Clamp).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn first_debit_materializes_row() {
        let (store, _dir) = test_store().await;
        let _ = store.debit("fresh", 10, OverdraftPolicy::Clamp).await.unwrap();
        assert_eq!(store.balance("fresh").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn concurrent_debits_reject_exactly_one() {
        let (store, _dir) = test_store().await;
        let store = Arc::new(store);
        store.credit("u1", 150).await.unwrap();

        let (a, b) = tokio::join!(
            store.debit("u1", 100, OverdraftPolicy::Reject),
            store.debit("u1", 100, OverdraftPolicy::Reject),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(store.balance("u1").await.unwrap(), Some(50));
    }

    #[tokio::test]
    async fn concurrent_debits_clamp_never_negative() {
        let (store, _dir) = test_store().await;
        store.credit("u1", 150).await.unwrap();

        let (a, b) = tokio::join!(
            store.debit("u1", 100, OverdraftPolicy::Clamp),
            store.debit("u1", 100, OverdraftPolicy::Clamp),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(store.balance("u1").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn backend_name() {
        let (store, _dir) = test_store().await;
        assert_eq!(UserDataStore::name(&store), "sqlite");
        assert_eq!(TokenLedger::name(&store), "sqlite");
    }
}
