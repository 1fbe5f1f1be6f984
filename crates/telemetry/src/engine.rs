//! Thread-safe telemetry engine: counts coach outcomes and keeps a ring of
//! recent events.

use crate::model::*;
use chrono::{DateTime, Utc};
use habitcoach_core::outcome::CoachMode;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const DEFAULT_CAPACITY: usize = 200;

/// The core telemetry engine.
///
/// Thread-safe via `RwLock`. Locks are never held across an await point.
pub struct TelemetryEngine {
    /// Recent events, oldest first, bounded by `capacity`.
    events: RwLock<VecDeque<OutcomeEvent>>,
    capacity: usize,
    /// Running totals.
    totals: RwLock<RunningTotals>,
}

#[derive(Debug, Default)]
struct RunningTotals {
    per_mode: BTreeMap<CoachMode, ModeCounters>,
    fallback_by_reason: BTreeMap<habitcoach_core::outcome::FallbackReason, u64>,
    ledger_failures: u64,
    since: Option<DateTime<Utc>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl TelemetryEngine {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Keep at most `capacity` recent events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            totals: RwLock::new(RunningTotals::default()),
        }
    }

    /// Record a finished request and update running totals.
    pub fn record(&self, event: OutcomeEvent) {
        {
            let mut totals = write(&self.totals);
            totals.since.get_or_insert(event.at);

            let counters = totals.per_mode.entry(event.mode).or_default();
            counters.requests += 1;
            counters.tokens_debited += event.tokens_debited;
            match event.kind {
                OutcomeKind::Ai => counters.ai += 1,
                OutcomeKind::Fallback { .. } => counters.fallback += 1,
                OutcomeKind::BudgetRejected => counters.budget_rejected += 1,
                OutcomeKind::Invalid => counters.invalid += 1,
            }

            if let OutcomeKind::Fallback { reason } = event.kind {
                *totals.fallback_by_reason.entry(reason).or_default() += 1;
            }
            if event.ledger_failed {
                totals.ledger_failures += 1;
            }
        }

        tracing::debug!(
            mode = %event.mode,
            user = %event.user_id,
            outcome = %event.kind,
            tokens = event.tokens_debited,
            "Outcome recorded"
        );

        let mut events = write(&self.events);
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Most recent events, newest first.
    pub fn recent_events(&self, limit: usize) -> Vec<OutcomeEvent> {
        read(&self.events).iter().rev().take(limit).cloned().collect()
    }

    pub fn event_count(&self) -> usize {
        read(&self.events).len()
    }

    /// Current usage totals.
    pub fn usage_snapshot(&self) -> UsageSnapshot {
        let totals = read(&self.totals);
        let mut snap = UsageSnapshot {
            ledger_failures: totals.ledger_failures,
            fallback_by_reason: totals.fallback_by_reason.clone(),
            per_mode: totals.per_mode.clone(),
            since: totals.since,
            ..Default::default()
        };
        for counters in totals.per_mode.values() {
            snap.total_requests += counters.requests;
            snap.ai_responses += counters.ai;
            snap.fallback_responses += counters.fallback;
            snap.budget_rejections += counters.budget_rejected;
            snap.tokens_debited += counters.tokens_debited;
        }
        snap
    }
}

impl Default for TelemetryEngine {
    fn default() -> Self {
        Self::new()
    }
}
