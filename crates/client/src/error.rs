use habitcoach_core::error::ValidationError;
use habitcoach_core::outcome::CoachMode;
use std::time::Duration;
use thiserror::Error;

/// Why a dispatch produced no coach reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Rejected locally; nothing was sent.
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Rejected locally; the previous request of this kind was too recent.
    #[error("Please wait {}ms before sending another {mode} request", .retry_after.as_millis())]
    TooSoon { mode: CoachMode, retry_after: Duration },

    #[error("The coach is taking too long to answer ({mode}, {}s)", .after.as_secs())]
    TimedOut { mode: CoachMode, after: Duration },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Insufficient tokens: balance {balance}, required {required}")]
    BudgetExhausted { balance: u64, required: u64 },

    #[error("Server rate limit reached")]
    RateLimited,

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}
