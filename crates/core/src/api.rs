//! HTTP wire types shared by the gateway and the client dispatcher.
//!
//! All fields are camelCase on the wire. Request fields default to empty so
//! a missing field surfaces as a [`ValidationError`] with a useful message
//! rather than a generic deserialization failure.

use serde::{Deserialize, Serialize};
use crate::error::ValidationError;
use crate::message::ConversationTurn;
use crate::outcome::FallbackReason;
use crate::recommendation::Recommendation;

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(field.into()));
    }
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field.into()));
    }
    Ok(())
}

// ── Requests ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_requested_count")]
    pub requested_count: usize,
}

fn default_requested_count() -> usize {
    3
}

impl RecommendRequest {
    pub fn validate(&self, max_count: usize) -> Result<(), ValidationError> {
        require("userId", &self.user_id)?;
        if self.requested_count == 0 || self.requested_count > max_count {
            return Err(ValidationError::OutOfRange {
                field: "requestedCount".into(),
                reason: format!("must be between 1 and {max_count}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: String,
    /// Optional screen/topic label, e.g. "goal_checkin".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_goals: Vec<String>,
    /// Recent history supplied by the client; the server keeps no session state.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub past_messages: Vec<ConversationTurn>,
}

/// Size caps on the free-text fields of a [`ConverseRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverseLimits {
    pub max_message_chars: usize,
    pub max_goals: usize,
    pub max_goal_chars: usize,
    pub max_context_chars: usize,
}

fn at_most(field: &str, value: &str, max_chars: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max_chars {
        return Err(ValidationError::OutOfRange {
            field: field.into(),
            reason: format!("must be at most {max_chars} characters"),
        });
    }
    Ok(())
}

impl ConverseRequest {
    /// History turns are not checked here; the pipeline clips them to the
    /// window and a per-turn character cap.
    pub fn validate(&self, limits: &ConverseLimits) -> Result<(), ValidationError> {
        require("userId", &self.user_id)?;
        require("message", &self.message)?;
        at_most("message", &self.message, limits.max_message_chars)?;
        if let Some(context) = &self.context {
            at_most("context", context, limits.max_context_chars)?;
        }
        if self.user_goals.len() > limits.max_goals {
            return Err(ValidationError::OutOfRange {
                field: "userGoals".into(),
                reason: format!("must list at most {} goals", limits.max_goals),
            });
        }
        for goal in &self.user_goals {
            at_most("userGoals", goal, limits.max_goal_chars)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: String,
    /// Analysis variant tag, e.g. "goal_quality" or "journal_emotion".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Requested output cap; can only lower the server's limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub user_id: String,
}

impl AnalyzeRequest {
    pub fn validate(&self, max_text_chars: usize) -> Result<(), ValidationError> {
        require("userId", &self.user_id)?;
        require("text", &self.text)?;
        at_most("text", &self.text, max_text_chars)?;
        if self.max_tokens == Some(0) {
            return Err(ValidationError::OutOfRange {
                field: "maxTokens".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

// ── Responses ─────────────────────────────────────────────────────────────

/// Token consumption for one request. `None` in a response means the ledger
/// update failed and the remaining balance is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenReport {
    pub used: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_focus_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub success: bool,
    pub recommendations: Vec<Recommendation>,
    pub metadata: RecommendMetadata,
    pub tokens: Option<TokenReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMetadata {
    pub tokens_used: u64,
    pub model: String,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    /// Persona phase for converse replies; resolved analysis variant for analyze.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverseData {
    pub response: String,
    pub metadata: ReplyMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverseResponse {
    pub success: bool,
    pub data: ConverseData,
    pub tokens: Option<TokenReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeData {
    pub analysis: String,
    pub metadata: ReplyMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: AnalyzeData,
    pub tokens: Option<TokenReport>,
}

/// Body of every non-2xx response.
///
/// For budget rejections `tokens` carries the current balance and
/// `required` the threshold that was not met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<u64>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            tokens: None,
            required: None,
        }
    }

    pub fn budget(balance: u64, required: u64) -> Self {
        Self {
            success: false,
            error: "Insufficient tokens".into(),
            tokens: Some(balance),
            required: Some(required),
        }
    }
}
