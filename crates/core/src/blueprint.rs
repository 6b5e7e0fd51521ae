//! The scenario blueprint: the structured plan a generation run is built
//! around, produced by a generative backend and then normalized and gated.

use serde::{Deserialize, Serialize};

/// Hard ceiling on modules per experience.
pub const MAX_MODULES: usize = 6;

/// Every module plays out over exactly this many decision rounds.
pub const ROUNDS_PER_MODULE: usize = 3;

/// Effects are clamped to this symmetric bound.
pub const EFFECT_BOUND: i32 = 12;

/// Literal tokens that count as "no real content".
const PLACEHOLDER_TOKENS: &[&str] = &[
    "-",
    "--",
    "---",
    "…",
    "...",
    "tbd",
    "todo",
    "n/a",
    "na",
    "placeholder",
    "coming soon",
];

/// True when a field is empty or a stock filler token.
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v.is_empty() || PLACEHOLDER_TOKENS.contains(&v.as_str())
}

/// State deltas one choice applies, each in `[-EFFECT_BOUND, EFFECT_BOUND]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effects {
    #[serde(default)]
    pub stability: i32,
    #[serde(default)]
    pub resource: i32,
    #[serde(default)]
    pub progress: i32,
}

impl Effects {
    /// Clamp every axis into the contract bound.
    pub fn clamped(self) -> Self {
        Self {
            stability: self.stability.clamp(-EFFECT_BOUND, EFFECT_BOUND),
            resource: self.resource.clamp(-EFFECT_BOUND, EFFECT_BOUND),
            progress: self.progress.clamp(-EFFECT_BOUND, EFFECT_BOUND),
        }
    }
}

/// One selectable option within a decision round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceOption {
    #[serde(default)]
    pub label: String,
    /// Consequence text shown after the choice.
    #[serde(default, alias = "consequence")]
    pub feedback: String,
    #[serde(default)]
    pub effects: Effects,
}

/// One decision round inside a module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Round {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub situation: String,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

/// The plan for a single playable module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModulePlan {
    #[serde(default)]
    pub title: String,
    /// Scene-setting brief for the module.
    #[serde(default, alias = "mission")]
    pub situation: String,
    #[serde(default)]
    pub rounds: Vec<Round>,
}

/// The full scenario blueprint for an experience.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default, alias = "bookTitle")]
    pub book_title: String,
    /// Narrative hook that opens the experience.
    #[serde(default, alias = "openingNarrative", alias = "opening")]
    pub opening_narrative: String,
    #[serde(default, alias = "learningObjective", alias = "objective")]
    pub learning_objective: String,
    /// Bulleted factual briefing drawn from the source material.
    #[serde(default, alias = "backgroundIntel", alias = "intel")]
    pub background_intel: Vec<String>,
    #[serde(default)]
    pub modules: Vec<ModulePlan>,
    /// Closing reflection shown after the last module.
    #[serde(default)]
    pub debrief: String,
}

impl Blueprint {
    /// All free text in the blueprint, joined for grounding analysis.
    pub fn flattened_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            &self.book_title,
            &self.opening_narrative,
            &self.learning_objective,
            &self.debrief,
        ];
        parts.extend(self.background_intel.iter().map(String::as_str));
        for module in &self.modules {
            parts.push(&module.title);
            parts.push(&module.situation);
            for round in &module.rounds {
                parts.push(&round.prompt);
                parts.push(&round.situation);
                for option in &round.options {
                    parts.push(&option.label);
                    parts.push(&option.feedback);
                }
            }
        }
        parts.join("\n")
    }
}
