//! # HabitCoach Core
//!
//! Domain types, traits, and error definitions for the HabitCoach AI
//! orchestration layer. This crate carries no framework dependencies; it
//! defines the model every other crate implements against.
//!
//! The app's own records (goals, journal, mood, exercise history) and the
//! per-user token budget are external collaborators. They appear here only
//! as the [`UserDataStore`] and [`TokenLedger`] traits.

pub mod api;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod message;
pub mod outcome;
pub mod provider;
pub mod recommendation;
pub mod snapshot;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use catalog::{Exercise, ExerciseCatalog, ExerciseKind};
pub use error::{Error, LedgerError, ProviderError, Result, SchemaError, StoreError, ValidationError};
pub use ledger::{OverdraftPolicy, TokenLedger};
pub use message::{ConversationTurn, Message, Role};
pub use outcome::{CoachMode, CoachOutcome, FallbackReason};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use recommendation::{Recommendation, RecommendationSet};
pub use snapshot::{SourceKind, UserContextSnapshot};
pub use store::{JournalEntry, UserDataStore};
