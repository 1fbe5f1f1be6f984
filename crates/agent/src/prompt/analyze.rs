use serde::Serialize;

/// Instruction variant for the analyze mode, chosen by the caller's context tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisVariant {
    GoalQuality,
    JournalEmotion,
    MoodPattern,
    General,
}

impl AnalysisVariant {
    /// Unknown or missing tags select `General`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("goal_quality") => Self::GoalQuality,
            Some("journal_emotion") => Self::JournalEmotion,
            Some("mood_pattern") => Self::MoodPattern,
            _ => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoalQuality => "goal_quality",
            Self::JournalEmotion => "journal_emotion",
            Self::MoodPattern => "mood_pattern",
            Self::General => "general",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Self::GoalQuality => {
                "Judge the goal below. Say whether it is specific, measurable and time-bound, \
                 name the weakest part, and rewrite it once as a sharper goal."
            }
            Self::JournalEmotion => {
                "Read the journal text below. Name the dominant emotions, what seems to trigger them, \
                 and one pattern the writer may not have noticed. Do not diagnose."
            }
            Self::MoodPattern => {
                "Look at the mood notes below together with the user's recent mood signals. \
                 Describe the trend, the likely drivers, and one small change to test this week."
            }
            Self::General => {
                "Analyze the text below in the context of the user's goals and recent state. \
                 Give the single most useful observation and one next step."
            }
        }
    }
}

impl std::fmt::Display for AnalysisVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
