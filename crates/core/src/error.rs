//! Error types for the HabitCoach domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant, and the top-level
//! [`Error`] decides how a failure propagates: validation and budget
//! errors are terminal, provider and schema errors route to a fallback,
//! ledger update errors are logged and swallowed.

use thiserror::Error;

/// The top-level error type for all HabitCoach operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Input errors (terminal, no cost incurred) ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Budget errors (terminal, no model call made) ---
    #[error("Insufficient token budget: balance {balance}, required {required}")]
    BudgetExhausted { balance: u64, required: u64 },

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Model output errors ---
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    // --- Ledger errors ---
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    // --- Data source errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is terminal for the request: returned directly to
    /// the caller without consulting the fallback strategy.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::BudgetExhausted { .. } | Self::Ledger(_)
        )
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Bad or missing input, caught before any network or model cost.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("field must not be blank: {0}")]
    BlankField(String),

    #[error("field {field} out of range: {reason}")]
    OutOfRange { field: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether the failure was the hard timeout rather than a transport or API error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// The model answered, but its output failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("model output is not valid JSON for the contract: {0}")]
    MalformedJson(String),

    #[error("model output is empty")]
    EmptyText,

    #[error("no valid items in model output ({dropped} dropped)")]
    NoValidItems { dropped: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance { balance: u64, requested: u64 },

    #[error("Ledger storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}
