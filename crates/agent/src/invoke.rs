//! Model invocation with a hard per-mode timeout.

use crate::context::token::text_tokens;
use crate::prompt::CompiledPrompt;
use habitcoach_core::error::ProviderError;
use habitcoach_core::provider::Provider;
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw model output plus what it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub raw_text: String,
    pub tokens_used: u64,
    pub model: String,
    /// False when `tokens_used` is an estimate.
    pub usage_reported: bool,
}

/// Sends compiled prompts to one provider. Never retries.
pub struct ModelClient {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn invoke(&self, prompt: &CompiledPrompt) -> Result<ModelReply, ProviderError> {
        let request = prompt.to_provider_request(&self.model);
        let timeout = prompt.knobs.timeout;

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            mode = %prompt.mode,
            timeout_secs = timeout.as_secs(),
            "Invoking model"
        );

        let response = match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    mode = %prompt.mode,
                    timeout_secs = timeout.as_secs(),
                    "Model call timed out"
                );
                return Err(ProviderError::Timeout(format!(
                    "{} did not answer within {}s",
                    self.provider.name(),
                    timeout.as_secs()
                )));
            }
        };

        let (tokens_used, usage_reported) = match response.reported_tokens() {
            Some(tokens) => (tokens, true),
            None => {
                let estimate = prompt.estimated_tokens + text_tokens(&response.content);
                warn!(
                    provider = self.provider.name(),
                    estimate,
                    "Provider omitted usage; debiting an estimate"
                );
                (estimate, false)
            }
        };

        let model = if response.model.is_empty() {
            self.model.clone()
        } else {
            response.model
        };

        Ok(ModelReply {
            raw_text: response.content,
            tokens_used,
            model,
            usage_reported,
        })
    }
}
