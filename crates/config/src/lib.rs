//! Configuration loading, validation, and management for HabitCoach.
//!
//! Loads configuration from `~/.habitcoach/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! [`AppConfig`] is the only configuration structure in the system: every
//! component receives the slice it needs at construction time.

use habitcoach_core::api::ConverseLimits;
use habitcoach_core::{CoachMode, OverdraftPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.habitcoach/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Replace the built-in exercise catalog with a TOML file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// User data store
    #[serde(default)]
    pub store: StoreConfig,

    /// Token ledger and per-mode budget thresholds
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Snapshot windows and caps
    #[serde(default)]
    pub context: ContextLimits,

    /// Per-mode model knobs
    #[serde(default)]
    pub modes: ModesConfig,

    /// Request input limits
    #[serde(default)]
    pub limits: InputLimits,

    /// Client dispatcher settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Outcome telemetry
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("catalog_path", &self.catalog_path)
            .field("gateway", &self.gateway)
            .field("store", &self.store)
            .field("ledger", &self.ledger)
            .field("context", &self.context)
            .field("modes", &self.modes)
            .field("limits", &self.limits)
            .field("client", &self.client)
            .field("providers", &self.providers)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

// ── Gateway ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Requests per minute per client before HTTP 429
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_rate_limit() -> u32 {
    60
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            rate_limit_per_minute: default_rate_limit(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ── Store & ledger ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Database file; defaults to `~/.habitcoach/habitcoach.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Database file; defaults to the store's database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub overdraft: OverdraftPolicy,

    /// Minimum balance required before a model call, per mode
    #[serde(default)]
    pub required: RequiredTokens,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
            overdraft: OverdraftPolicy::default(),
            required: RequiredTokens::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredTokens {
    #[serde(default = "default_required_recommend")]
    pub recommend: u64,
    #[serde(default = "default_required_converse")]
    pub converse: u64,
    #[serde(default = "default_required_analyze")]
    pub analyze: u64,
}

fn default_required_recommend() -> u64 {
    1500
}
fn default_required_converse() -> u64 {
    1000
}
fn default_required_analyze() -> u64 {
    800
}

impl RequiredTokens {
    pub fn for_mode(&self, mode: CoachMode) -> u64 {
        match mode {
            CoachMode::Recommend => self.recommend,
            CoachMode::Converse => self.converse,
            CoachMode::Analyze => self.analyze,
        }
    }
}

impl Default for RequiredTokens {
    fn default() -> Self {
        Self {
            recommend: default_required_recommend(),
            converse: default_required_converse(),
            analyze: default_required_analyze(),
        }
    }
}

// ── Context snapshot ──────────────────────────────────────────────────────

/// Time windows and item caps for each snapshot source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextLimits {
    #[serde(default = "default_weekly_goals")]
    pub weekly_goals: usize,
    #[serde(default = "default_long_term_goals")]
    pub long_term_goals: usize,
    #[serde(default = "default_seven")]
    pub mood_days: i64,
    #[serde(default = "default_mood_limit")]
    pub mood_limit: usize,
    #[serde(default = "default_seven")]
    pub journal_days: i64,
    #[serde(default = "default_journal_limit")]
    pub journal_limit: usize,
    /// Characters kept per journal excerpt
    #[serde(default = "default_excerpt_chars")]
    pub journal_excerpt_chars: usize,
    #[serde(default = "default_exercise_days")]
    pub exercise_days: i64,
    #[serde(default = "default_exercise_limit")]
    pub exercise_limit: usize,
    /// Most recent conversation turns sent to the model
    #[serde(default = "default_conversation_turns")]
    pub conversation_turns: usize,
    /// Upper bound for a single source read
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
}

fn default_weekly_goals() -> usize {
    5
}
fn default_long_term_goals() -> usize {
    3
}
fn default_seven() -> i64 {
    7
}
fn default_mood_limit() -> usize {
    14
}
fn default_journal_limit() -> usize {
    5
}
fn default_excerpt_chars() -> usize {
    280
}
fn default_exercise_days() -> i64 {
    14
}
fn default_exercise_limit() -> usize {
    10
}
fn default_conversation_turns() -> usize {
    6
}
fn default_source_timeout_ms() -> u64 {
    2000
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            weekly_goals: default_weekly_goals(),
            long_term_goals: default_long_term_goals(),
            mood_days: default_seven(),
            mood_limit: default_mood_limit(),
            journal_days: default_seven(),
            journal_limit: default_journal_limit(),
            journal_excerpt_chars: default_excerpt_chars(),
            exercise_days: default_exercise_days(),
            exercise_limit: default_exercise_limit(),
            conversation_turns: default_conversation_turns(),
            source_timeout_ms: default_source_timeout_ms(),
        }
    }
}

// ── Mode knobs ────────────────────────────────────────────────────────────

/// Fixed model parameters for one mode. Never user-controllable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeKnobs {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    800
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for ModeKnobs {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModesConfig {
    #[serde(default = "default_recommend_knobs")]
    pub recommend: ModeKnobs,
    #[serde(default = "default_converse_knobs")]
    pub converse: ModeKnobs,
    #[serde(default = "default_analyze_knobs")]
    pub analyze: ModeKnobs,
}

fn default_recommend_knobs() -> ModeKnobs {
    ModeKnobs {
        max_tokens: 1200,
        temperature: 0.4,
        timeout_secs: 30,
    }
}
fn default_converse_knobs() -> ModeKnobs {
    ModeKnobs {
        max_tokens: 500,
        temperature: 0.8,
        timeout_secs: 30,
    }
}
fn default_analyze_knobs() -> ModeKnobs {
    ModeKnobs {
        max_tokens: 700,
        temperature: 0.5,
        timeout_secs: 30,
    }
}

impl ModesConfig {
    pub fn knobs(&self, mode: CoachMode) -> &ModeKnobs {
        match mode {
            CoachMode::Recommend => &self.recommend,
            CoachMode::Converse => &self.converse,
            CoachMode::Analyze => &self.analyze,
        }
    }
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            recommend: default_recommend_knobs(),
            converse: default_converse_knobs(),
            analyze: default_analyze_knobs(),
        }
    }
}

// ── Input limits ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLimits {
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_max_analyze_chars")]
    pub max_analyze_chars: usize,
    /// Longest history turn that reaches the prompt; longer ones are clipped
    #[serde(default = "default_max_message_chars")]
    pub max_turn_chars: usize,
    #[serde(default = "default_max_goals")]
    pub max_goals: usize,
    #[serde(default = "default_max_goal_chars")]
    pub max_goal_chars: usize,
    /// Longest converse `context` label
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_max_recommendations() -> usize {
    10
}
fn default_max_message_chars() -> usize {
    2000
}
fn default_max_analyze_chars() -> usize {
    8000
}
fn default_max_goals() -> usize {
    10
}
fn default_max_goal_chars() -> usize {
    200
}
fn default_max_context_chars() -> usize {
    64
}

impl InputLimits {
    pub fn converse(&self) -> ConverseLimits {
        ConverseLimits {
            max_message_chars: self.max_message_chars,
            max_goals: self.max_goals,
            max_goal_chars: self.max_goal_chars,
            max_context_chars: self.max_context_chars,
        }
    }
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_recommendations: default_max_recommendations(),
            max_message_chars: default_max_message_chars(),
            max_analyze_chars: default_max_analyze_chars(),
            max_turn_chars: default_max_message_chars(),
            max_goals: default_max_goals(),
            max_goal_chars: default_max_goal_chars(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

// ── Client dispatcher ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Minimum gap between two requests of the same kind
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    #[serde(default)]
    pub timeout_secs: ClientTimeouts,

    /// Output cap the client asks for on analyze; the server may lower it
    #[serde(default = "default_analyze_max_tokens")]
    pub analyze_max_tokens: u32,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8787".into()
}
fn default_min_interval_ms() -> u64 {
    2000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            min_interval_ms: default_min_interval_ms(),
            timeout_secs: ClientTimeouts::default(),
            analyze_max_tokens: default_analyze_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientTimeouts {
    #[serde(default = "default_client_timeout")]
    pub recommend: u64,
    #[serde(default = "default_client_timeout")]
    pub converse: u64,
    #[serde(default = "default_client_timeout")]
    pub analyze: u64,
}

fn default_client_timeout() -> u64 {
    45
}

impl ClientTimeouts {
    pub fn for_mode(&self, mode: CoachMode) -> u64 {
        match mode {
            CoachMode::Recommend => self.recommend,
            CoachMode::Converse => self.converse,
            CoachMode::Analyze => self.analyze,
        }
    }
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            recommend: default_client_timeout(),
            converse: default_client_timeout(),
            analyze: default_client_timeout(),
        }
    }
}

fn default_analyze_max_tokens() -> u32 {
    500
}

// ── Providers & telemetry ─────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Recent outcome events kept in memory
    #[serde(default = "default_recent_events")]
    pub recent_events: usize,
}

fn default_recent_events() -> usize {
    200
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_events: default_recent_events(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.habitcoach/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `HABITCOACH_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    /// - `OPENROUTER_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("HABITCOACH_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .or_else(|| lookup("OPENROUTER_API_KEY"));
        }

        if let Some(provider) = lookup("HABITCOACH_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("HABITCOACH_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".habitcoach")
    }

    /// The SQLite file used by the user data store.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("habitcoach.db"))
    }

    /// The SQLite file used by the ledger; shares the store's file by default.
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger.path.clone().unwrap_or_else(|| self.store_path())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for backend in [&self.store.backend, &self.ledger.backend] {
            if backend != "sqlite" && backend != "memory" {
                return Err(ConfigError::ValidationError(format!(
                    "unknown backend '{backend}' (expected 'sqlite' or 'memory')"
                )));
            }
        }

        for mode in CoachMode::ALL {
            let knobs = self.modes.knobs(mode);
            if !(0.0..=2.0).contains(&knobs.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "modes.{mode}.temperature must be between 0.0 and 2.0"
                )));
            }
            if knobs.max_tokens == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "modes.{mode}.max_tokens must be > 0"
                )));
            }
            if knobs.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "modes.{mode}.timeout_secs must be > 0"
                )));
            }
        }

        if self.context.conversation_turns == 0 {
            return Err(ConfigError::ValidationError(
                "context.conversation_turns must be > 0".into(),
            ));
        }

        if self.context.source_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "context.source_timeout_ms must be > 0".into(),
            ));
        }

        if self.limits.max_recommendations == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_recommendations must be > 0".into(),
            ));
        }

        if self.limits.max_turn_chars == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_turn_chars must be > 0".into(),
            ));
        }

        if self.gateway.rate_limit_per_minute == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.rate_limit_per_minute must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Model for the default provider: its own `default_model` if set,
    /// otherwise the top-level one.
    pub fn active_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            catalog_path: None,
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
            ledger: LedgerConfig::default(),
            context: ContextLimits::default(),
            modes: ModesConfig::default(),
            limits: InputLimits::default(),
            client: ClientConfig::default(),
            providers: HashMap::new(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
