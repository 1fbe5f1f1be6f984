//! Data model for outcome events and usage snapshots.

use chrono::{DateTime, Utc};
use habitcoach_core::outcome::{CoachMode, FallbackReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ── Events ────────────────────────────────────────────────────────────────

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The model answered and the answer passed validation.
    Ai,
    /// A deterministic substitute was served.
    Fallback { reason: FallbackReason },
    /// Balance below the mode's threshold; no model call.
    BudgetRejected,
    /// Bad input; no model call.
    Invalid,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ai => write!(f, "ai"),
            Self::Fallback { reason } => write!(f, "fallback:{reason}"),
            Self::BudgetRejected => write!(f, "budget_rejected"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// One finished coach request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub id: String,
    pub mode: CoachMode,
    pub user_id: String,
    pub kind: OutcomeKind,
    /// Tokens actually debited from the ledger (0 when nothing was charged).
    pub tokens_debited: u64,
    /// The post-call debit failed; the response carried `tokens: null`.
    pub ledger_failed: bool,
    pub duration_ms: u64,
    pub at: DateTime<Utc>,
}

impl OutcomeEvent {
    pub fn new(mode: CoachMode, user_id: impl Into<String>, kind: OutcomeKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mode,
            user_id: user_id.into(),
            kind,
            tokens_debited: 0,
            ledger_failed: false,
            duration_ms: 0,
            at: Utc::now(),
        }
    }

    pub fn with_tokens(mut self, tokens: u64) -> Self {
        self.tokens_debited = tokens;
        self
    }

    pub fn with_ledger_failure(mut self) -> Self {
        self.ledger_failed = true;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────

/// Counters for one mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCounters {
    pub requests: u64,
    pub ai: u64,
    pub fallback: u64,
    pub budget_rejected: u64,
    pub invalid: u64,
    pub tokens_debited: u64,
}

/// Point-in-time usage totals, served at `GET /v1/usage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub total_requests: u64,
    pub ai_responses: u64,
    pub fallback_responses: u64,
    pub budget_rejections: u64,
    pub tokens_debited: u64,
    pub ledger_failures: u64,
    pub fallback_by_reason: BTreeMap<FallbackReason, u64>,
    pub per_mode: BTreeMap<CoachMode, ModeCounters>,
    pub since: Option<DateTime<Utc>>,
}

impl UsageSnapshot {
    /// Share of answered requests that came from the model, 0.0..=1.0.
    pub fn ai_ratio(&self) -> f64 {
        let answered = self.ai_responses + self.fallback_responses;
        if answered == 0 {
            return 0.0;
        }
        self.ai_responses as f64 / answered as f64
    }
}
