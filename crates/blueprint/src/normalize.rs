//! Blueprint normalization.
//!
//! Whatever shape the generator returned, the normalized blueprint has
//! exactly `module_count` modules of exactly three rounds each, every
//! field trimmed and capped, and all effects inside the contract bound.
//! Normalization is idempotent.

use playforge_core::blueprint::{
    Blueprint, MAX_MODULES, ModulePlan, ROUNDS_PER_MODULE, Round,
};
use playforge_core::text::{clamp_chars, collapse_whitespace, text_or};

const MAX_INTEL_BULLETS: usize = 8;
const MAX_OPTIONS: usize = 4;

fn clean(value: &str, max_chars: usize) -> String {
    clamp_chars(&collapse_whitespace(value), max_chars)
}

pub fn normalize_blueprint(raw: Blueprint, fallback_title: &str, module_count: usize) -> Blueprint {
    let module_count = module_count.clamp(1, MAX_MODULES);

    let book_title = clean(text_or(&raw.book_title, fallback_title), 120);

    let mut modules: Vec<ModulePlan> = raw.modules.into_iter().take(module_count).collect();
    while modules.len() < module_count {
        modules.push(ModulePlan::default());
    }
    let modules = modules
        .into_iter()
        .enumerate()
        .map(|(index, module)| normalize_module(module, index))
        .collect();

    Blueprint {
        book_title,
        opening_narrative: clean(&raw.opening_narrative, 600),
        learning_objective: clean(&raw.learning_objective, 240),
        background_intel: raw
            .background_intel
            .iter()
            .map(|bullet| clean(bullet, 200))
            .filter(|bullet| !playforge_core::blueprint::is_placeholder(bullet))
            .take(MAX_INTEL_BULLETS)
            .collect(),
        modules,
        debrief: clean(&raw.debrief, 400),
    }
}

fn normalize_module(module: ModulePlan, index: usize) -> ModulePlan {
    let default_title = format!("Act {}", index + 1);
    let title = clean(text_or(&module.title, &default_title), 96);

    let mut rounds: Vec<Round> = module.rounds.into_iter().take(ROUNDS_PER_MODULE).collect();
    while rounds.len() < ROUNDS_PER_MODULE {
        rounds.push(Round::default());
    }
    let rounds = rounds
        .into_iter()
        .map(|mut round| {
            round.prompt = clean(&round.prompt, 300);
            round.situation = clean(&round.situation, 400);
            round.options = round
                .options
                .into_iter()
                .take(MAX_OPTIONS)
                .map(|mut option| {
                    option.label = clean(&option.label, 80);
                    option.feedback = clean(&option.feedback, 240);
                    option.effects = option.effects.clamped();
                    option
                })
                .collect();
            round
        })
        .collect();

    ModulePlan { title, situation: clean(&module.situation, 400), rounds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playforge_core::blueprint::{ChoiceOption, EFFECT_BOUND, Effects};

    fn raw_with_rounds(rounds: usize) -> Blueprint {
        Blueprint {
            book_title: "  A   Title  ".into(),
            modules: vec![ModulePlan {
                title: String::new(),
                situation: "s".into(),
                rounds: (0..rounds)
                    .map(|i| Round {
                        prompt: format!("prompt {i}"),
                        options: vec![ChoiceOption {
                            label: "opt".into(),
                            feedback: "fb".into(),
                            effects: Effects { stability: 18, resource: -30, progress: 3 },
                        }],
                        ..Default::default()
                    })
                    .collect(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn rounds_are_padded_and_truncated_to_three() {
        let padded = normalize_blueprint(raw_with_rounds(1), "fb", 1);
        assert_eq!(padded.modules[0].rounds.len(), ROUNDS_PER_MODULE);

        let truncated = normalize_blueprint(raw_with_rounds(5), "fb", 1);
        assert_eq!(truncated.modules[0].rounds.len(), ROUNDS_PER_MODULE);
        assert_eq!(truncated.modules[0].rounds[2].prompt, "prompt 2");
    }

    #[test]
    fn effects_are_clamped_to_twelve() {
        let normalized = normalize_blueprint(raw_with_rounds(3), "fb", 1);
        let effects = normalized.modules[0].rounds[0].options[0].effects;
        assert_eq!(effects.stability, EFFECT_BOUND);
        assert_eq!(effects.resource, -EFFECT_BOUND);
        assert_eq!(effects.progress, 3);
    }

    #[test]
    fn modules_pad_to_requested_count_with_act_titles() {
        let normalized = normalize_blueprint(raw_with_rounds(3), "fb", 3);
        assert_eq!(normalized.modules.len(), 3);
        assert_eq!(normalized.modules[0].title, "Act 1");
        assert_eq!(normalized.modules[2].title, "Act 3");
    }

    #[test]
    fn module_count_is_bounded() {
        let normalized = normalize_blueprint(raw_with_rounds(3), "fb", 99);
        assert_eq!(normalized.modules.len(), MAX_MODULES);
    }

    #[test]
    fn placeholder_intel_bullets_are_dropped() {
        let raw = Blueprint {
            background_intel: vec!["TBD".into(), "Grain reserves fell by half.".into(), "---".into()],
            ..Default::default()
        };
        let normalized = normalize_blueprint(raw, "fb", 1);
        assert_eq!(normalized.background_intel, vec!["Grain reserves fell by half."]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_blueprint(raw_with_rounds(5), "fb", 2);
        let twice = normalize_blueprint(once.clone(), "fb", 2);
        assert_eq!(serde_json::to_value(&once).unwrap(), serde_json::to_value(&twice).unwrap());
    }

    #[test]
    fn empty_title_falls_back() {
        let raw = Blueprint::default();
        let normalized = normalize_blueprint(raw, "The Chronicle", 1);
        assert_eq!(normalized.book_title, "The Chronicle");
    }
}
