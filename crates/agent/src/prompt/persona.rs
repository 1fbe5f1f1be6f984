//! The coach persona for conversations.
//!
//! The coach opens by asking pointed questions, then switches to issuing
//! commands once it has heard enough. The phase is derived from how many
//! times the coach has already spoken in the truncated window, so it is a
//! pure function of the turns sent to the model.

use habitcoach_core::message::ConversationTurn;
use serde::Serialize;

/// Coach replies needed before the persona starts directing.
pub const DIRECTING_AFTER_COACH_TURNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Questioning,
    Directing,
}

impl Phase {
    pub fn from_window(window: &[ConversationTurn]) -> Self {
        let coach_turns = window.iter().filter(|t| !t.is_user).count();
        if coach_turns >= DIRECTING_AFTER_COACH_TURNS {
            Self::Directing
        } else {
            Self::Questioning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Questioning => "questioning",
            Self::Directing => "directing",
        }
    }

    pub fn directive(&self) -> &'static str {
        match self {
            Self::Questioning => {
                "Current phase: QUESTIONING.\n\
                 Ask one or two sharp, specific questions that expose what is really blocking the user. \
                 Do not give advice yet. Do not accept vague answers; ask for specifics."
            }
            Self::Directing => {
                "Current phase: DIRECTING.\n\
                 Stop asking questions. Give one concrete command the user must carry out today, \
                 with a time and a measurable result. \
                 End by telling the user to come back with proof that it is done."
            }
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed persona text shared by both phases.
pub const PERSONA: &str = "You are HabitCoach, a blunt accountability coach. \
You are warm but you do not tolerate excuses. You refer to the user's actual goals, moods and \
history instead of generic advice. Keep replies short enough to read on a phone.";
