//! Scripted collaborators shared by the agent tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use habitcoach_core::error::{LedgerError, ProviderError, StoreError};
use habitcoach_core::ledger::{OverdraftPolicy, TokenLedger};
use habitcoach_core::message::ConversationTurn;
use habitcoach_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use habitcoach_core::snapshot::{ExerciseRecord, GoalHorizon, GoalSignal, MoodSignal, SourceKind};
use habitcoach_core::store::{JournalEntry, UserDataStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Providers ─────────────────────────────────────────────────────────────

/// A successful reply with reported usage.
pub fn reply(content: &str, total_tokens: u32) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse {
        content: content.into(),
        usage: Some(Usage {
            prompt_tokens: total_tokens / 2,
            completion_tokens: total_tokens - total_tokens / 2,
            total_tokens,
        }),
        model: "mock-model".into(),
    })
}

/// A successful reply without usage metadata.
pub fn reply_without_usage(content: &str) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse {
        content: content.into(),
        usage: None,
        model: "mock-model".into(),
    })
}

/// Replays scripted results in order and records every request it sees.
pub struct ScriptedProvider {
    script: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(ProviderError::Network("script exhausted".into()));
        }
        script.remove(0)
    }
}

// ── Stores ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum SourceBehavior {
    Fail,
    Delay(Duration),
}

/// Wraps a real store and makes chosen sources fail or stall.
pub struct FlakyStore {
    inner: Arc<dyn UserDataStore>,
    behaviors: HashMap<SourceKind, SourceBehavior>,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn UserDataStore>) -> Self {
        Self {
            inner,
            behaviors: HashMap::new(),
        }
    }

    pub fn with(mut self, source: SourceKind, behavior: SourceBehavior) -> Self {
        self.behaviors.insert(source, behavior);
        self
    }

    async fn gate(&self, source: SourceKind) -> Result<(), StoreError> {
        match self.behaviors.get(&source) {
            Some(SourceBehavior::Fail) => Err(StoreError::Unavailable(format!("{source} offline"))),
            Some(SourceBehavior::Delay(d)) => {
                tokio::time::sleep(*d).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserDataStore for FlakyStore {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn recent_goals(
        &self,
        user_id: &str,
        horizon: GoalHorizon,
        limit: usize,
    ) -> Result<Vec<GoalSignal>, StoreError> {
        let source = match horizon {
            GoalHorizon::Weekly => SourceKind::WeeklyGoals,
            GoalHorizon::LongTerm => SourceKind::LongTermGoals,
        };
        self.gate(source).await?;
        self.inner.recent_goals(user_id, horizon, limit).await
    }

    async fn mood_logs(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MoodSignal>, StoreError> {
        self.gate(SourceKind::Mood).await?;
        self.inner.mood_logs(user_id, since, limit).await
    }

    async fn journal_entries(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        self.gate(SourceKind::Journal).await?;
        self.inner.journal_entries(user_id, since, limit).await
    }

    async fn exercise_completions(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ExerciseRecord>, StoreError> {
        self.gate(SourceKind::ExerciseHistory).await?;
        self.inner.exercise_completions(user_id, since, limit).await
    }

    async fn conversation_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        self.gate(SourceKind::Conversation).await?;
        self.inner.conversation_turns(user_id, limit).await
    }

    async fn favorites(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.gate(SourceKind::Favorites).await?;
        self.inner.favorites(user_id).await
    }
}

// ── Ledgers ───────────────────────────────────────────────────────────────

/// A ledger whose reads or debits always fail.
pub struct BrokenLedger {
    pub balance_fails: bool,
    pub debit_fails: bool,
    pub balance: u64,
    pub debits: Mutex<Vec<u64>>,
}

impl BrokenLedger {
    pub fn unreadable() -> Self {
        Self {
            balance_fails: true,
            debit_fails: true,
            balance: 0,
            debits: Mutex::new(Vec::new()),
        }
    }

    pub fn undebitable(balance: u64) -> Self {
        Self {
            balance_fails: false,
            debit_fails: true,
            balance,
            debits: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TokenLedger for BrokenLedger {
    fn name(&self) -> &str {
        "broken"
    }

    async fn balance(&self, _user_id: &str) -> Result<Option<u64>, LedgerError> {
        if self.balance_fails {
            return Err(LedgerError::Unavailable("ledger offline".into()));
        }
        Ok(Some(self.balance))
    }

    async fn debit(&self, _user_id: &str, amount: u64, _policy: OverdraftPolicy) -> Result<u64, LedgerError> {
        self.debits.lock().unwrap().push(amount);
        if self.debit_fails {
            return Err(LedgerError::Storage("write rejected".into()));
        }
        Ok(self.balance.saturating_sub(amount))
    }
}
