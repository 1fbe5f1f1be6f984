//! Prompt compilation: snapshot + request → a bounded, contract-bearing prompt.

pub mod analyze;
pub mod compiler;
pub mod contract;
pub mod persona;

pub use analyze::AnalysisVariant;
pub use compiler::PromptCompiler;
pub use contract::OutputContract;
pub use persona::Phase;

use habitcoach_core::message::Message;
use habitcoach_core::outcome::CoachMode;
use habitcoach_core::provider::ProviderRequest;
use std::time::Duration;

/// What the caller wants compiled.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptRequest {
    Recommend {
        count: usize,
    },
    Converse {
        message: String,
        context: Option<String>,
        user_goals: Vec<String>,
    },
    Analyze {
        text: String,
        context_tag: Option<String>,
        max_tokens: Option<u32>,
    },
}

impl PromptRequest {
    pub fn mode(&self) -> CoachMode {
        match self {
            Self::Recommend { .. } => CoachMode::Recommend,
            Self::Converse { .. } => CoachMode::Converse,
            Self::Analyze { .. } => CoachMode::Analyze,
        }
    }
}

/// Model parameters fixed per mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knobs {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// A prompt ready for the model client.
#[derive(Debug, Clone)]
pub struct CompiledPrompt {
    pub mode: CoachMode,
    pub system_prompt: String,
    /// Conversation messages after the system prompt, oldest first.
    pub messages: Vec<Message>,
    pub output_contract: OutputContract,
    pub knobs: Knobs,
    /// Rough input size, used when the provider omits usage.
    pub estimated_tokens: u64,
    /// Converse only.
    pub phase: Option<Phase>,
    /// Analyze only.
    pub variant: Option<AnalysisVariant>,
}

impl CompiledPrompt {
    pub fn to_provider_request(&self, model: &str) -> ProviderRequest {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(self.messages.iter().cloned());
        ProviderRequest {
            model: model.to_string(),
            messages,
            temperature: self.knobs.temperature,
            max_tokens: Some(self.knobs.max_tokens),
            json_output: self.output_contract.is_json(),
        }
    }
}
