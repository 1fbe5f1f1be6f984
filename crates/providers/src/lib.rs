//! LLM provider implementations for HabitCoach.
//!
//! One wire protocol, many endpoints: [`select`] resolves the configured
//! default provider to an [`OpenAiCompatProvider`].

pub mod openai_compat;
pub mod selection;

pub use openai_compat::OpenAiCompatProvider;
pub use selection::{ProviderSelection, known_endpoint, select};
