//! Pre-flight budget checks and post-call debits against the token ledger.

use habitcoach_core::error::{Error, LedgerError};
use habitcoach_core::ledger::{OverdraftPolicy, TokenLedger};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of a pre-flight balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetCheck {
    pub has_enough: bool,
    pub balance: u64,
    pub required: u64,
}

/// Guards model calls with the user's token balance.
///
/// The check is advisory: it decides whether to call the model at all. The
/// debit after the call is the authoritative write, and the ledger itself
/// keeps it atomic.
pub struct LedgerGuard {
    ledger: Arc<dyn TokenLedger>,
    policy: OverdraftPolicy,
}

impl LedgerGuard {
    pub fn new(ledger: Arc<dyn TokenLedger>, policy: OverdraftPolicy) -> Self {
        Self { ledger, policy }
    }

    pub fn policy(&self) -> OverdraftPolicy {
        self.policy
    }

    /// Read the balance and compare it to `required`. A user with no ledger
    /// row has a balance of zero.
    pub async fn check_budget(&self, user_id: &str, required: u64) -> Result<BudgetCheck, LedgerError> {
        let balance = self.ledger.balance(user_id).await?.unwrap_or(0);
        let check = BudgetCheck {
            has_enough: balance >= required,
            balance,
            required,
        };
        debug!(user = %user_id, balance, required, ok = check.has_enough, "Budget checked");
        Ok(check)
    }

    /// Like [`check_budget`](Self::check_budget), but a short balance is an
    /// [`Error::BudgetExhausted`].
    pub async fn ensure_budget(&self, user_id: &str, required: u64) -> Result<BudgetCheck, Error> {
        let check = self.check_budget(user_id, required).await?;
        if !check.has_enough {
            info!(user = %user_id, balance = check.balance, required, "Request rejected: insufficient tokens");
            return Err(Error::BudgetExhausted {
                balance: check.balance,
                required,
            });
        }
        Ok(check)
    }

    /// Charge `tokens` and return the new balance.
    ///
    /// The model call has already been paid for, so a `Reject` overdraft
    /// still drains the balance to zero; otherwise the same user would pass
    /// the next budget check for free. Never fails the request: a ledger
    /// error is logged and surfaces as `None`, which callers report as
    /// `tokens: null`.
    pub async fn debit(&self, user_id: &str, tokens: u64) -> Option<u64> {
        if tokens == 0 {
            return match self.ledger.balance(user_id).await {
                Ok(balance) => Some(balance.unwrap_or(0)),
                Err(e) => {
                    error!(user = %user_id, error = %e, "Ledger read failed after zero-cost call");
                    None
                }
            };
        }
        match self.ledger.debit(user_id, tokens, self.policy).await {
            Ok(remaining) => {
                debug!(user = %user_id, tokens, remaining, "Tokens debited");
                Some(remaining)
            }
            Err(LedgerError::InsufficientBalance { balance, .. }) => {
                warn!(user = %user_id, tokens, balance, "Call cost exceeded balance; draining to zero");
                match self.ledger.debit(user_id, tokens, OverdraftPolicy::Clamp).await {
                    Ok(remaining) => Some(remaining),
                    Err(e) => {
                        error!(user = %user_id, tokens, error = %e, "Ledger drain failed; response will omit token totals");
                        None
                    }
                }
            }
            Err(e) => {
                error!(
                    user = %user_id,
                    tokens,
                    policy = %self.policy,
                    error = %e,
                    "Ledger update failed; response will omit token totals"
                );
                None
            }
        }
    }
}
