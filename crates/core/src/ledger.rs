//! Token ledger trait: the per-user spend budget.
//!
//! The ledger is an external store of record. The coach reads balances and
//! debits actual usage; replenishment belongs to billing and is not part of
//! this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::LedgerError;

/// What a debit does when the amount exceeds the balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdraftPolicy {
    /// Fail with `InsufficientBalance` and leave the balance untouched.
    #[default]
    Reject,
    /// Floor the balance at zero.
    Clamp,
}

impl std::fmt::Display for OverdraftPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Clamp => write!(f, "clamp"),
        }
    }
}

/// The core TokenLedger trait.
///
/// `debit` must be atomic with respect to concurrent debits for the same
/// user: implementations perform the check-and-subtract as one store-level
/// operation, never as a separate read followed by a write. The balance is
/// never negative.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Current balance, or `None` if the user has no ledger row yet.
    async fn balance(&self, user_id: &str) -> Result<Option<u64>, LedgerError>;

    /// Subtract `amount` and return the new balance.
    ///
    /// Creates the user's row (at zero) if it does not exist yet.
    async fn debit(
        &self,
        user_id: &str,
        amount: u64,
        policy: OverdraftPolicy,
    ) -> Result<u64, LedgerError>;
}
