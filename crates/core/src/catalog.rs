//! Exercise catalog: static, read-only reference data.
//!
//! Every recommendation must resolve against this catalog. The built-in set
//! can be replaced at startup by a TOML file with `[[exercises]]` tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::Error;

/// Broad category of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Breathing,
    Mindfulness,
    Journaling,
    Movement,
    Reflection,
    Planning,
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Breathing => write!(f, "breathing"),
            Self::Mindfulness => write!(f, "mindfulness"),
            Self::Journaling => write!(f, "journaling"),
            Self::Movement => write!(f, "movement"),
            Self::Reflection => write!(f, "reflection"),
            Self::Planning => write!(f, "planning"),
        }
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub kind: ExerciseKind,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: String,
    pub default_duration_minutes: u32,
    /// One-line statement of what the exercise is good for.
    pub benefit: String,
}

#[derive(Deserialize)]
struct CatalogFile {
    exercises: Vec<Exercise>,
}

/// Lookup table of exercises, preserving declaration order for prompts.
#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    exercises: Vec<Exercise>,
    index: HashMap<String, usize>,
}

impl ExerciseCatalog {
    /// Build a catalog from a list of exercises. Duplicate ids are rejected.
    pub fn new(exercises: Vec<Exercise>) -> Result<Self, Error> {
        let mut index = HashMap::with_capacity(exercises.len());
        for (i, exercise) in exercises.iter().enumerate() {
            if exercise.id.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("exercise #{i} has an empty id"),
                });
            }
            if index.insert(exercise.id.clone(), i).is_some() {
                return Err(Error::Config {
                    message: format!("duplicate exercise id '{}'", exercise.id),
                });
            }
        }
        Ok(Self { exercises, index })
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let file: CatalogFile = toml::from_str(text).map_err(|e| Error::Config {
            message: format!("invalid exercise catalog: {e}"),
        })?;
        Self::new(file.exercises)
    }

    /// Load a catalog from a TOML file on disk.
    pub fn load(path: &std::path::Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read catalog {}: {e}", path.display()),
        })?;
        let catalog = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), count = catalog.len(), "Loaded exercise catalog");
        Ok(catalog)
    }

    /// Resolve an exercise id.
    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.index.get(id).map(|&i| &self.exercises[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All exercises in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter()
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// The catalog that ships with the binary.
    pub fn builtin() -> Self {
        let exercises = vec![
            entry("box-breathing", "Box Breathing", ExerciseKind::Breathing, &["stress", "focus", "quick"],
                "Inhale, hold, exhale and hold again for four counts each.", 4,
                "Lowers arousal and restores focus within minutes"),
            entry("478-breathing", "4-7-8 Breath", ExerciseKind::Breathing, &["sleep", "anxiety"],
                "Inhale for 4, hold for 7, exhale slowly for 8.", 3,
                "Calms the nervous system before sleep"),
            entry("body-scan", "Body Scan", ExerciseKind::Mindfulness, &["stress", "sleep", "awareness"],
                "Move attention slowly from feet to head, noticing sensations without judging them.", 10,
                "Releases held tension and builds body awareness"),
            entry("five-senses", "5-4-3-2-1 Grounding", ExerciseKind::Mindfulness, &["anxiety", "quick"],
                "Name five things you see, four you hear, three you feel, two you smell, one you taste.", 3,
                "Interrupts anxious spirals by anchoring in the present"),
            entry("gratitude-three", "Three Good Things", ExerciseKind::Journaling, &["mood", "evening"],
                "Write down three things that went well today and why they happened.", 5,
                "Shifts attention toward progress and lifts mood"),
            entry("excuse-audit", "Excuse Audit", ExerciseKind::Reflection, &["accountability", "goals"],
                "List the reasons you gave yourself for skipping a commitment and test each one.", 8,
                "Separates real obstacles from rationalizations"),
            entry("brisk-walk", "Ten-Minute Brisk Walk", ExerciseKind::Movement, &["energy", "mood", "outdoor"],
                "Walk briskly for ten minutes without your phone.", 10,
                "Raises energy and clears a foggy head"),
            entry("desk-stretch", "Desk Stretch Sequence", ExerciseKind::Movement, &["quick", "posture"],
                "Neck rolls, shoulder openers and a standing forward fold.", 5,
                "Undoes stiffness from long sitting"),
            entry("tomorrow-top3", "Tomorrow's Top Three", ExerciseKind::Planning, &["goals", "evening", "focus"],
                "Pick the three tasks that would make tomorrow a win and schedule the first one.", 5,
                "Turns vague intentions into a concrete start"),
            entry("implementation-intention", "If-Then Plan", ExerciseKind::Planning, &["goals", "accountability"],
                "Write one 'If situation X happens, then I will do Y' plan for your hardest habit.", 5,
                "Makes follow-through automatic in tricky moments"),
            entry("emotion-labeling", "Name It to Tame It", ExerciseKind::Journaling, &["mood", "anxiety"],
                "Write the exact emotion you feel, its intensity from 1 to 10, and what triggered it.", 5,
                "Reduces the grip of strong emotions"),
            entry("weekly-review", "Weekly Review", ExerciseKind::Reflection, &["goals", "planning"],
                "Review last week's goals: what moved, what stalled, what to drop.", 15,
                "Keeps goals aligned with what actually happens"),
        ];
        // Built-in ids are unique by construction.
        Self::new(exercises).unwrap_or_default()
    }
}

fn entry(
    id: &str,
    title: &str,
    kind: ExerciseKind,
    tags: &[&str],
    description: &str,
    minutes: u32,
    benefit: &str,
) -> Exercise {
    Exercise {
        id: id.into(),
        title: title.into(),
        kind,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: description.into(),
        default_duration_minutes: minutes,
        benefit: benefit.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_resolves_ids() {
        let catalog = ExerciseCatalog::builtin();
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.get("box-breathing").unwrap().kind, ExerciseKind::Breathing);
        assert!(catalog.get("made-up").is_none());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let a = entry("x", "X", ExerciseKind::Movement, &[], "d", 1, "b");
        let result = ExerciseCatalog::new(vec![a.clone(), a]);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn catalog_from_toml() {
        let text = r#"
[[exercises]]
id = "cold-shower"
title = "Cold Shower"
kind = "movement"
tags = ["energy"]
description = "Finish your shower with 30 seconds of cold water."
default_duration_minutes = 1
benefit = "Wakes you up"
"#;
        let catalog = ExerciseCatalog::from_toml_str(text).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("cold-shower"));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let result = ExerciseCatalog::from_toml_str("exercises = 3");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
