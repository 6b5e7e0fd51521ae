//! Deterministic blueprint fallback for runs without any generative
//! backend. Built entirely from the highest-signal source sentences, so
//! it is grounded by construction.

use playforge_core::Context;
use playforge_core::blueprint::{
    Blueprint, ChoiceOption, Effects, ModulePlan, ROUNDS_PER_MODULE, Round,
};
use playforge_core::text::{clamp_chars, split_sentences};

/// Build a playable blueprint straight from the context.
pub fn fallback_blueprint(context: &Context, terms: &[String], module_count: usize) -> Blueprint {
    let sentences = ranked_sentences(&context.text, terms);
    let pick = |index: usize| -> String {
        sentences
            .get(index % sentences.len().max(1))
            .cloned()
            .unwrap_or_else(|| context.title.clone())
    };

    let opening = format!(
        "You step into the world of \"{}\". {} {}",
        context.title,
        pick(0),
        pick(1)
    );
    let objective = format!(
        "Work through the key decisions behind \"{}\" and judge their trade-offs firsthand.",
        context.title
    );
    let intel: Vec<String> =
        (0..4.min(sentences.len().max(1))).map(|i| clamp_chars(&pick(i), 200)).collect();
    let debrief = format!(
        "Each decision traded one pressure against another. Revisit the source material on \"{}\" \
         and check which trade-offs the record actually bears out.",
        context.title
    );

    let modules = (0..module_count.max(1))
        .map(|m| {
            let title = format!("Act {}: {}", m + 1, clamp_chars(&pick(m * 4), 60));
            let rounds = (0..ROUNDS_PER_MODULE)
                .map(|r| {
                    let anchor = pick(m * 4 + r + 1);
                    Round {
                        prompt: format!("Given the situation, what is your call? {}", clamp_chars(&anchor, 180)),
                        situation: clamp_chars(&anchor, 360),
                        options: vec![
                            ChoiceOption {
                                label: "Act decisively now".into(),
                                feedback: format!(
                                    "Moving early shapes events, but the record warns: {}",
                                    clamp_chars(&pick(m * 4 + r + 2), 160)
                                ),
                                effects: Effects { stability: -4, resource: -2, progress: 8 },
                            },
                            ChoiceOption {
                                label: "Hold and gather more intelligence".into(),
                                feedback: format!(
                                    "Waiting preserves your position while rivals move: {}",
                                    clamp_chars(&pick(m * 4 + r + 3), 160)
                                ),
                                effects: Effects { stability: 6, resource: 2, progress: -3 },
                            },
                        ],
                    }
                })
                .collect();
            ModulePlan {
                title,
                situation: clamp_chars(&pick(m * 4), 360),
                rounds,
            }
        })
        .collect();

    Blueprint {
        book_title: context.title.clone(),
        opening_narrative: opening,
        learning_objective: objective,
        background_intel: intel,
        modules,
        debrief,
    }
}

/// Sentences ordered by grounding-term hits, ties by source order.
fn ranked_sentences(text: &str, terms: &[String]) -> Vec<String> {
    let mut scored: Vec<(usize, usize, String)> = split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(index, sentence)| {
            let lower = sentence.to_lowercase();
            let hits = terms.iter().filter(|t| lower.contains(t.as_str())).count();
            (hits, index, sentence)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, s)| s).collect()
}
