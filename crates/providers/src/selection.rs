//! Picks the one provider the coach talks to.
//!
//! Every backend speaks the OpenAI chat-completions protocol, so selection
//! is just resolving a name to an endpoint, a key and a model.

use crate::openai_compat::OpenAiCompatProvider;
use habitcoach_config::AppConfig;
use habitcoach_core::error::ProviderError;
use habitcoach_core::provider::Provider;
use std::sync::Arc;

/// Endpoints for provider names that need no `api_url`.
pub const KNOWN_ENDPOINTS: &[(&str, &str)] = &[
    ("openai", "https://api.openai.com/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("together", "https://api.together.xyz/v1"),
    ("deepseek", "https://api.deepseek.com/v1"),
    ("ollama", "http://localhost:11434/v1"),
];

/// Local servers that accept any key.
const KEYLESS: &[&str] = &["ollama"];

pub fn known_endpoint(name: &str) -> Option<&'static str> {
    KNOWN_ENDPOINTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, url)| *url)
}

/// The resolved default provider.
pub struct ProviderSelection {
    pub name: String,
    pub base_url: String,
    pub model: String,
    /// False when no key was found and the endpoint needs one.
    pub has_key: bool,
    provider: Arc<dyn Provider>,
}

impl ProviderSelection {
    pub fn provider(&self) -> Arc<dyn Provider> {
        self.provider.clone()
    }
}

impl std::fmt::Debug for ProviderSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSelection")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("has_key", &self.has_key)
            .finish()
    }
}

/// Resolve `default_provider` against `[providers.<name>]` and the
/// well-known endpoints. A per-provider key beats the top-level one.
///
/// Fails only when the name is unknown and no `api_url` is configured.
pub fn select(config: &AppConfig) -> Result<ProviderSelection, ProviderError> {
    let name = config.default_provider.as_str();
    let section = config.providers.get(name);

    let base_url = section
        .and_then(|p| p.api_url.clone())
        .or_else(|| known_endpoint(name).map(String::from))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{name}'; set providers.{name}.api_url"
            ))
        })?;

    let api_key = section
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone());
    let has_key = api_key.is_some() || KEYLESS.contains(&name);

    let provider = OpenAiCompatProvider::new(name, &base_url, api_key.unwrap_or_default());

    Ok(ProviderSelection {
        name: name.to_string(),
        base_url,
        model: config.active_model().to_string(),
        has_key,
        provider: Arc::new(provider),
    })
}
