//! Blueprint quality gates: grounding against the source vocabulary and
//! structural density.

use playforge_context::term_overlap;
use playforge_core::Blueprint;
use playforge_core::blueprint::{ROUNDS_PER_MODULE, is_placeholder};
use playforge_core::grounding::{DensityIssue, GroundingReport};

/// Generic writing-craft vocabulary. A blueprint leaning on these while
/// the source material never uses them was invented, not grounded.
const WRITING_BIAS_TERMS: &[&str] = &[
    "写作技巧",
    "文笔",
    "修辞",
    "叙事结构",
    "人物塑造",
    "情节设计",
    "伏笔",
    "写作风格",
    "narrative arc",
    "prose style",
    "foreshadowing",
    "character development",
    "plot structure",
    "literary device",
];

fn bias_term_count(text_lower: &str) -> usize {
    WRITING_BIAS_TERMS.iter().filter(|term| text_lower.contains(*term)).count()
}

/// Score a blueprint's overlap with the grounding vocabulary.
pub fn assess_grounding(blueprint: &Blueprint, terms: &[String], context_text: &str) -> GroundingReport {
    let flattened = blueprint.flattened_text();
    let (matched, missing) = term_overlap(&flattened, terms);
    let hits = matched.len();
    let overlap_ratio = if terms.is_empty() { 0.0 } else { hits as f64 / terms.len() as f64 };

    let blueprint_bias = bias_term_count(&flattened.to_lowercase());
    let context_bias = bias_term_count(&context_text.to_lowercase());
    let writing_bias = blueprint_bias >= 2 && context_bias == 0;

    GroundingReport { hits, overlap_ratio, matched, missing, writing_bias }
}

/// Return the first structural-density problem, or `None` for a
/// blueprint dense enough to compile.
pub fn find_density_issue(blueprint: &Blueprint) -> Option<DensityIssue> {
    let chars = |s: &str| s.chars().count();

    if chars(&blueprint.book_title) < 8 {
        return Some(DensityIssue::ShortTitle);
    }
    if chars(&blueprint.opening_narrative) < 72 {
        return Some(DensityIssue::ShortOpening);
    }
    if chars(&blueprint.learning_objective) < 36 {
        return Some(DensityIssue::ShortObjective);
    }
    if blueprint.background_intel.len() < 4 {
        return Some(DensityIssue::ThinIntel { bullets: blueprint.background_intel.len() });
    }
    if chars(&blueprint.debrief) < 60 {
        return Some(DensityIssue::ShortDebrief);
    }

    for (m, module) in blueprint.modules.iter().enumerate() {
        if module.rounds.len() != ROUNDS_PER_MODULE {
            return Some(DensityIssue::WrongRoundCount { module: m, rounds: module.rounds.len() });
        }
        for (r, round) in module.rounds.iter().enumerate() {
            if chars(&round.prompt) < 18 {
                return Some(DensityIssue::ShortRoundPrompt { module: m, round: r });
            }
            if chars(&round.situation) < 20 {
                return Some(DensityIssue::ShortRoundSituation { module: m, round: r });
            }
            let usable_options = round
                .options
                .iter()
                .filter(|o| !is_placeholder(&o.label) && !is_placeholder(&o.feedback))
                .count();
            if usable_options < 2 {
                return Some(DensityIssue::PlaceholderOption { module: m, round: r });
            }
        }
    }
    None
}

#[cfg(test)]
pub(crate) fn dense_blueprint() -> Blueprint {
    use playforge_core::blueprint::{ChoiceOption, Effects, ModulePlan, Round};

    let option = |label: &str, feedback: &str| ChoiceOption {
        label: label.into(),
        feedback: feedback.into(),
        effects: Effects { stability: 4, resource: -2, progress: 3 },
    };
    let round = |n: usize| Round {
        prompt: format!("Round {n}: choose how the treasury answers the grain shortfall."),
        situation: format!("Advisors disagree about levy {n} while reserves keep falling."),
        options: vec![
            option("Raise the provincial levy", "Revenue climbs but provincial anger spreads."),
            option("Release the grain reserve", "Prices ease while the reserve drains further."),
        ],
    };
    Blueprint {
        book_title: "The Fiscal Collapse".into(),
        opening_narrative: "The treasury ledgers show a shortfall no coin debasement can hide, \
            and the grain fleets are late for the second season running."
            .into(),
        learning_objective: "Practice sequencing fiscal triage under compounding shortages.".into(),
        background_intel: vec![
            "Grain reserves fell to a two-month supply.".into(),
            "The provincial levy was doubled last spring.".into(),
            "Coin debasement pushed prices up forty percent.".into(),
            "The eastern market closed for nine days after riots.".into(),
        ],
        modules: vec![ModulePlan {
            title: "The Levy Decision".into(),
            situation: "The council must balance revenue against unrest.".into(),
            rounds: vec![round(1), round(2), round(3)],
        }],
        debrief: "Fiscal shocks compound: each levy, release, and debasement narrows the options \
            available in the next season."
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_blueprint_has_no_issue() {
        assert_eq!(find_density_issue(&dense_blueprint()), None);
    }

    #[test]
    fn each_floor_is_detected() {
        let mut b = dense_blueprint();
        b.book_title = "Short".into();
        assert_eq!(find_density_issue(&b), Some(DensityIssue::ShortTitle));

        let mut b = dense_blueprint();
        b.background_intel.truncate(2);
        assert_eq!(find_density_issue(&b), Some(DensityIssue::ThinIntel { bullets: 2 }));

        let mut b = dense_blueprint();
        b.modules[0].rounds.pop();
        assert_eq!(
            find_density_issue(&b),
            Some(DensityIssue::WrongRoundCount { module: 0, rounds: 2 })
        );

        let mut b = dense_blueprint();
        b.modules[0].rounds[1].prompt = "Too short".into();
        assert_eq!(
            find_density_issue(&b),
            Some(DensityIssue::ShortRoundPrompt { module: 0, round: 1 })
        );
    }

    #[test]
    fn placeholder_options_are_an_issue() {
        let mut b = dense_blueprint();
        b.modules[0].rounds[2].options[0].label = "TBD".into();
        assert_eq!(
            find_density_issue(&b),
            Some(DensityIssue::PlaceholderOption { module: 0, round: 2 })
        );
    }

    #[test]
    fn grounding_scores_overlap() {
        let blueprint = dense_blueprint();
        let terms: Vec<String> =
            ["grain", "levy", "treasury", "debasement", "flotilla", "aqueduct"]
                .iter()
                .map(|s| s.to_string())
                .collect();
        let report = assess_grounding(&blueprint, &terms, "grain levy treasury context");
        assert_eq!(report.hits, 4);
        assert!((report.overlap_ratio - 4.0 / 6.0).abs() < 1e-9);
        assert_eq!(report.missing, vec!["flotilla", "aqueduct"]);
        assert!(report.passed());
    }

    #[test]
    fn writing_bias_requires_absence_in_context() {
        let mut blueprint = dense_blueprint();
        blueprint.opening_narrative =
            format!("{} The prose style and foreshadowing matter here.", blueprint.opening_narrative);
        let terms: Vec<String> = ["grain", "levy", "treasury", "debasement"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let biased = assess_grounding(&blueprint, &terms, "plain source text about grain");
        assert!(biased.writing_bias);
        assert!(!biased.passed());

        let excused = assess_grounding(&blueprint, &terms, "a guide to prose style and grain");
        assert!(!excused.writing_bias);
    }
}
