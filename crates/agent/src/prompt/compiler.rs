//! The prompt compiler.
//!
//! Pure and deterministic: the same snapshot and request always compile to
//! the same prompt. Nothing here touches the network or the ledger.

use super::analyze::AnalysisVariant;
use super::contract::OutputContract;
use super::persona::{PERSONA, Phase};
use super::{CompiledPrompt, Knobs, PromptRequest};
use crate::context::token::prompt_tokens;
use habitcoach_config::ModesConfig;
use habitcoach_core::catalog::ExerciseCatalog;
use habitcoach_core::message::{recent_window, Message};
use habitcoach_core::outcome::CoachMode;
use habitcoach_core::snapshot::{GoalHorizon, UserContextSnapshot};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

pub struct PromptCompiler {
    catalog: Arc<ExerciseCatalog>,
    modes: ModesConfig,
    /// Most recent turns kept in a conversation prompt.
    window: usize,
}

impl PromptCompiler {
    pub fn new(catalog: Arc<ExerciseCatalog>, modes: ModesConfig, window: usize) -> Self {
        Self { catalog, modes, window }
    }

    pub fn compile(&self, snapshot: &UserContextSnapshot, request: &PromptRequest) -> CompiledPrompt {
        let mode = request.mode();
        let mut knobs = self.knobs(mode);

        let mut phase = None;
        let mut variant = None;

        let (system_prompt, messages, output_contract) = match request {
            PromptRequest::Recommend { count } => {
                let contract = OutputContract::RecommendationJson { count: *count };
                let system = [
                    PERSONA.to_string(),
                    "Your task: pick the exercises from the catalog that will help this user most right now.".into(),
                    summarize(snapshot),
                    self.catalog_listing(),
                    contract.instructions(),
                ]
                .join("\n\n");
                let ask = Message::user(format!("Recommend {count} exercises for me right now."));
                (system, vec![ask], contract)
            }
            PromptRequest::Converse {
                message,
                context,
                user_goals,
            } => {
                let window = recent_window(&snapshot.conversation_window, self.window);
                let current = Phase::from_window(&window);
                phase = Some(current);

                let mut sections = vec![PERSONA.to_string(), current.directive().to_string()];
                if let Some(label) = context.as_deref().filter(|c| !c.trim().is_empty()) {
                    sections.push(format!("The user opened this chat from: {}", label.trim()));
                }
                if !user_goals.is_empty() {
                    let mut goals = String::from("## Goals the user mentioned\n");
                    for goal in user_goals.iter().filter(|g| !g.trim().is_empty()) {
                        let _ = writeln!(goals, "- {}", goal.trim());
                    }
                    sections.push(goals.trim_end().to_string());
                }
                sections.push(summarize(snapshot));
                let contract = OutputContract::FreeText;
                sections.push(contract.instructions());

                let mut messages: Vec<Message> = window.iter().map(|t| t.to_message()).collect();
                messages.push(Message::user(message.trim()));
                (sections.join("\n\n"), messages, contract)
            }
            PromptRequest::Analyze {
                text,
                context_tag,
                max_tokens,
            } => {
                let chosen = AnalysisVariant::from_tag(context_tag.as_deref());
                variant = Some(chosen);
                if let Some(cap) = max_tokens {
                    knobs.max_tokens = knobs.max_tokens.min(*cap);
                }
                let contract = OutputContract::FreeText;
                let system = [
                    "You are HabitCoach's analyst. Be concrete and kind, and never invent facts about the user.".to_string(),
                    chosen.instruction().to_string(),
                    summarize(snapshot),
                    contract.instructions(),
                ]
                .join("\n\n");
                (system, vec![Message::user(text.trim())], contract)
            }
        };

        let estimated_tokens = prompt_tokens(&system_prompt, &messages);

        tracing::debug!(
            mode = %mode,
            turns = messages.len(),
            estimated_tokens,
            max_tokens = knobs.max_tokens,
            "Prompt compiled"
        );

        CompiledPrompt {
            mode,
            system_prompt,
            messages,
            output_contract,
            knobs,
            estimated_tokens,
            phase,
            variant,
        }
    }

    fn knobs(&self, mode: CoachMode) -> Knobs {
        let k = self.modes.knobs(mode);
        Knobs {
            max_tokens: k.max_tokens,
            temperature: k.temperature,
            timeout: Duration::from_secs(k.timeout_secs),
        }
    }

    fn catalog_listing(&self) -> String {
        let mut out = String::from("## Exercise catalog (id | title | type | tags | benefit)\n");
        for e in self.catalog.iter() {
            let _ = writeln!(
                out,
                "{} | {} | {} | {} | {}",
                e.id,
                e.title,
                e.kind,
                e.tags.join(", "),
                e.benefit
            );
        }
        out.trim_end().to_string()
    }
}

/// Compact, line-oriented view of the snapshot. Empty sections are omitted.
fn summarize(snapshot: &UserContextSnapshot) -> String {
    let mut out = String::from("## What we know about the user\n");
    if snapshot.is_blank() {
        out.push_str("Nothing recorded yet. Do not pretend to know their history.");
        return out;
    }

    for (label, horizon) in [("Weekly goals", GoalHorizon::Weekly), ("Long-term goals", GoalHorizon::LongTerm)] {
        let goals: Vec<_> = snapshot
            .goals_for(horizon)
            .map(|g| format!("{} ({})", g.text, g.status))
            .collect();
        if !goals.is_empty() {
            let _ = writeln!(out, "{label}: {}", goals.join("; "));
        }
    }
    if !snapshot.mood_signals.is_empty() {
        let moods: Vec<_> = snapshot
            .mood_signals
            .iter()
            .map(|m| match &m.note {
                Some(note) if !note.trim().is_empty() => {
                    format!("{} {} ({})", m.created_at.format("%a"), m.label, note.trim())
                }
                _ => format!("{} {}", m.created_at.format("%a"), m.label),
            })
            .collect();
        let _ = writeln!(out, "Recent moods: {}", moods.join(", "));
    }
    for j in &snapshot.journal_signals {
        let _ = writeln!(out, "Journal ({}): {}", j.created_at.format("%b %d"), j.excerpt);
    }
    if !snapshot.exercise_history.is_empty() {
        let done: Vec<_> = snapshot
            .exercise_history
            .iter()
            .map(|e| format!("{} on {}", e.exercise_id, e.completed_at.format("%b %d")))
            .collect();
        let _ = writeln!(out, "Completed exercises: {}", done.join(", "));
    }
    if !snapshot.favorites.is_empty() {
        let favs: Vec<&str> = snapshot.favorites.iter().map(String::as_str).collect();
        let _ = writeln!(out, "Favorites: {}", favs.join(", "));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use habitcoach_core::message::{ConversationTurn, Role};
    use habitcoach_core::snapshot::{GoalSignal, GoalStatus, MoodSignal};
    use chrono::{Duration as ChronoDuration, Utc};

    fn compiler() -> PromptCompiler {
        PromptCompiler::new(Arc::new(ExerciseCatalog::builtin()), ModesConfig::default(), 6)
    }

    fn snapshot() -> UserContextSnapshot {
        let now = Utc::now();
        let mut snap = UserContextSnapshot::empty("u1");
        snap.goals.push(GoalSignal {
            text: "Run three times".into(),
            status: GoalStatus::Active,
            horizon: GoalHorizon::Weekly,
            source: "user".into(),
            created_at: now,
        });
        snap.mood_signals.push(MoodSignal {
            label: "stressed".into(),
            note: Some("deadline".into()),
            created_at: now,
        });
        snap.favorites.insert("box-breathing".into());
        snap
    }

    #[test]
    fn recommend_carries_catalog_snapshot_and_contract() {
        let prompt = compiler().compile(&snapshot(), &PromptRequest::Recommend { count: 3 });
        assert_eq!(prompt.mode, CoachMode::Recommend);
        assert!(prompt.system_prompt.contains("box-breathing | Box Breathing"));
        assert!(prompt.system_prompt.contains("weekly-review"));
        assert!(prompt.system_prompt.contains("Run three times (active)"));
        assert!(prompt.system_prompt.contains("stressed (deadline)"));
        assert!(prompt.system_prompt.contains("exactly 3 items"));
        assert_eq!(prompt.output_contract, OutputContract::RecommendationJson { count: 3 });
        assert_eq!(prompt.knobs.max_tokens, 1200);
        assert!(prompt.estimated_tokens > 0);

        let request = prompt.to_provider_request("gpt-4o-mini");
        assert!(request.json_output);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.max_tokens, Some(1200));
    }

    #[test]
    fn converse_window_truncated_to_six() {
        let base = Utc::now() - ChronoDuration::hours(1);
        let mut snap = snapshot();
        snap.conversation_window = (0..20)
            .map(|i| {
                let at = base + ChronoDuration::seconds(i);
                if i % 2 == 0 {
                    ConversationTurn::user(format!("msg {i}"), at)
                } else {
                    ConversationTurn::coach(format!("msg {i}"), at)
                }
            })
            .collect();
        let prompt = compiler().compile(
            &snap,
            &PromptRequest::Converse {
                message: "I skipped again".into(),
                context: None,
                user_goals: vec![],
            },
        );
        // Six history turns plus the new message.
        assert_eq!(prompt.messages.len(), 7);
        assert_eq!(prompt.messages[0].content, "msg 14");
        assert_eq!(prompt.messages[5].content, "msg 19");
        assert_eq!(prompt.messages[6].content, "I skipped again");
        let request = prompt.to_provider_request("m");
        assert!(!request.messages.iter().any(|m| m.content == "msg 13"));
        assert!(!request.json_output);
    }

    #[test]
    fn converse_phase_follows_window() {
        let c = compiler();
        let request = PromptRequest::Converse {
            message: "hi".into(),
            context: Some("goals_screen".into()),
            user_goals: vec!["Sleep by 11".into()],
        };
        let fresh = c.compile(&UserContextSnapshot::empty("u1"), &request);
        assert_eq!(fresh.phase, Some(Phase::Questioning));
        assert!(fresh.system_prompt.contains("QUESTIONING"));
        assert!(fresh.system_prompt.contains("goals_screen"));
        assert!(fresh.system_prompt.contains("- Sleep by 11"));

        let now = Utc::now();
        let mut snap = UserContextSnapshot::empty("u1");
        snap.conversation_window = vec![
            ConversationTurn::user("a", now),
            ConversationTurn::coach("b", now + ChronoDuration::seconds(1)),
            ConversationTurn::user("c", now + ChronoDuration::seconds(2)),
            ConversationTurn::coach("d", now + ChronoDuration::seconds(3)),
        ];
        let later = c.compile(&snap, &request);
        assert_eq!(later.phase, Some(Phase::Directing));
        assert!(later.system_prompt.contains("proof"));
    }

    #[test]
    fn analyze_caller_may_only_lower_max_tokens() {
        let c = compiler();
        let lower = c.compile(
            &snapshot(),
            &PromptRequest::Analyze {
                text: "Lose weight".into(),
                context_tag: Some("goal_quality".into()),
                max_tokens: Some(200),
            },
        );
        assert_eq!(lower.knobs.max_tokens, 200);
        assert_eq!(lower.variant, Some(AnalysisVariant::GoalQuality));
        assert!(lower.system_prompt.contains("measurable"));

        let higher = c.compile(
            &snapshot(),
            &PromptRequest::Analyze {
                text: "Lose weight".into(),
                context_tag: Some("unknown".into()),
                max_tokens: Some(100_000),
            },
        );
        assert_eq!(higher.knobs.max_tokens, 700);
        assert_eq!(higher.variant, Some(AnalysisVariant::General));
    }

    #[test]
    fn compilation_is_deterministic() {
        let c = compiler();
        let snap = snapshot();
        let request = PromptRequest::Recommend { count: 2 };
        let a = c.compile(&snap, &request);
        let b = c.compile(&snap, &request);
        assert_eq!(a.system_prompt, b.system_prompt);
        assert_eq!(a.messages, b.messages);
    }

    #[test]
    fn blank_snapshot_says_so() {
        let prompt = compiler().compile(&UserContextSnapshot::empty("new"), &PromptRequest::Recommend { count: 1 });
        assert!(prompt.system_prompt.contains("Nothing recorded yet"));
    }
}
