//! The HabitCoach orchestration core.
//!
//! Turns a coach request into a bounded, metered model call:
//!
//! 1. **Guard** the user's token balance before anything costs money
//! 2. **Gather** a multi-source snapshot of the user's recent state
//! 3. **Compile** it into a prompt with a strict output contract
//! 4. **Invoke** the model under a hard timeout
//! 5. **Validate** the reply, or substitute a deterministic **fallback**
//! 6. **Debit** what the call actually cost
//!
//! [`CoachPipeline`] sequences these steps for the three modes
//! (recommend, converse, analyze).

pub mod context;
pub mod fallback;
pub mod invoke;
pub mod ledger_guard;
pub mod pipeline;
pub mod prompt;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::ContextAggregator;
pub use fallback::FallbackStrategy;
pub use invoke::{ModelClient, ModelReply};
pub use ledger_guard::{BudgetCheck, LedgerGuard};
pub use pipeline::{CoachPipeline, CoachResponse};
pub use prompt::{AnalysisVariant, CompiledPrompt, OutputContract, Phase, PromptCompiler, PromptRequest};
pub use validate::{ResponseValidator, ValidatedRecommendations};
