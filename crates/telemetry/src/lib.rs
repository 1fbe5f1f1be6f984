//! Outcome accounting for HabitCoach.
//!
//! Every coach request ends in one of a few ways: a genuine model answer, a
//! tagged fallback, a budget rejection or a validation rejection. The
//! engine counts each, per mode, along with tokens debited and ledger
//! failures, and keeps a bounded ring of recent events for inspection.

pub mod engine;
pub mod model;

pub use engine::TelemetryEngine;
pub use model::{ModeCounters, OutcomeEvent, OutcomeKind, UsageSnapshot};
