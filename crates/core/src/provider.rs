//! The seam between the coach and an LLM backend.
//!
//! A provider takes a fully compiled prompt and returns the complete text
//! plus whatever usage it reports. There is no streaming and no tool
//! calling: each coach call is one bounded request/response.

use async_trait::async_trait;
use crate::error::ProviderError;
use crate::message::Message;

/// One model call, already shaped by the prompt compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub model: String,
    /// System message first, then history, then the new user turn.
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask for a JSON object when the output contract is structured.
    pub json_output: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub content: String,
    /// `None` when the provider sent no usage block.
    pub usage: Option<Usage>,
    /// The model that actually answered; may differ from the one requested.
    pub model: String,
}

impl ProviderResponse {
    /// Tokens the provider says it spent, if it said.
    pub fn reported_tokens(&self) -> Option<u64> {
        self.usage.map(|u| u64::from(u.total_tokens))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Whether the backend is reachable. Used by diagnostics only.
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_tokens_follow_usage() {
        let mut response = ProviderResponse {
            content: "Try a body scan tonight.".into(),
            usage: Some(Usage {
                prompt_tokens: 210,
                completion_tokens: 40,
                total_tokens: 250,
            }),
            model: "gpt-4o-mini".into(),
        };
        assert_eq!(response.reported_tokens(), Some(250));

        response.usage = None;
        assert_eq!(response.reported_tokens(), None);
    }
}
