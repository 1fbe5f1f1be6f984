//! Coach modes and the AI-vs-fallback outcome wrapper.

use serde::{Deserialize, Serialize};

/// The three request kinds the coach serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachMode {
    Recommend,
    Converse,
    Analyze,
}

impl CoachMode {
    pub const ALL: [CoachMode; 3] = [Self::Recommend, Self::Converse, Self::Analyze];
}

impl std::fmt::Display for CoachMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recommend => write!(f, "recommend"),
            Self::Converse => write!(f, "converse"),
            Self::Analyze => write!(f, "analyze"),
        }
    }
}

/// Why a response was produced by the fallback strategy instead of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    BudgetExhausted,
    ProviderError,
    SchemaError,
    Timeout,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BudgetExhausted => write!(f, "budget_exhausted"),
            Self::ProviderError => write!(f, "provider_error"),
            Self::SchemaError => write!(f, "schema_error"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Either genuine model output or a tagged degraded substitute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoachOutcome<T> {
    Ai { payload: T },
    Fallback { payload: T, reason: FallbackReason },
}

impl<T> CoachOutcome<T> {
    pub fn ai(payload: T) -> Self {
        Self::Ai { payload }
    }

    pub fn fallback(payload: T, reason: FallbackReason) -> Self {
        Self::Fallback { payload, reason }
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Ai { .. })
    }

    pub fn reason(&self) -> Option<FallbackReason> {
        match self {
            Self::Ai { .. } => None,
            Self::Fallback { reason, .. } => Some(*reason),
        }
    }

    pub fn payload(&self) -> &T {
        match self {
            Self::Ai { payload } | Self::Fallback { payload, .. } => payload,
        }
    }

    pub fn into_payload(self) -> T {
        match self {
            Self::Ai { payload } | Self::Fallback { payload, .. } => payload,
        }
    }
}
