//! Message and conversation-turn value objects.
//!
//! A [`Message`] is what goes to the model (role + content). A
//! [`ConversationTurn`] is what the persisted chat log holds: the core only
//! ever reads a bounded suffix of that log and never writes to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message sender in a model prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI coach
    Assistant,
    /// System instructions (persona, contract)
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// One entry of the persisted coach conversation log.
///
/// Ordered by `created_at`, immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub content: String,
    pub is_user: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            is_user: true,
            created_at,
        }
    }

    pub fn coach(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            is_user: false,
            created_at,
        }
    }

    pub fn role(&self) -> Role {
        if self.is_user { Role::User } else { Role::Assistant }
    }

    /// Cut the content to at most `max_chars` characters.
    pub fn clip(&mut self, max_chars: usize) {
        if let Some((cut, _)) = self.content.char_indices().nth(max_chars) {
            self.content.truncate(cut);
        }
    }

    /// Convert into a prompt message.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role(),
            content: self.content.clone(),
        }
    }
}

/// Keep only the most recent `limit` turns, in chronological order.
///
/// Input order is not trusted: turns are sorted by `created_at` first
/// (stable, so equal timestamps keep their relative order).
pub fn recent_window(turns: &[ConversationTurn], limit: usize) -> Vec<ConversationTurn> {
    let mut ordered = turns.to_vec();
    ordered.sort_by_key(|t| t.created_at);
    let skip = ordered.len().saturating_sub(limit);
    ordered.into_iter().skip(skip).collect()
}
