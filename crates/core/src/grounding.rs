//! Quality-gate verdict types for blueprint grounding and density.

use serde::{Deserialize, Serialize};

/// Minimum fraction of grounding terms a blueprint must echo.
pub const MIN_OVERLAP_RATIO: f64 = 0.16;

/// Minimum absolute number of grounding-term hits.
pub const MIN_TERM_HITS: usize = 4;

/// Outcome of checking a blueprint against the context vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingReport {
    /// Number of grounding terms the blueprint contains.
    pub hits: usize,
    /// `hits / terms considered`, in `[0, 1]`.
    pub overlap_ratio: f64,
    /// Terms present in the blueprint, for retry hints.
    pub matched: Vec<String>,
    /// Terms absent from the blueprint, for retry hints.
    pub missing: Vec<String>,
    /// Set when the blueprint leans on generic writing-craft vocabulary
    /// the source material never uses.
    pub writing_bias: bool,
}

impl GroundingReport {
    pub fn passed(&self) -> bool {
        self.overlap_ratio >= MIN_OVERLAP_RATIO && self.hits >= MIN_TERM_HITS && !self.writing_bias
    }
}

/// The first structural-density problem found in a blueprint, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DensityIssue {
    ShortTitle,
    ShortOpening,
    ShortObjective,
    ThinIntel { bullets: usize },
    ShortDebrief,
    WrongRoundCount { module: usize, rounds: usize },
    ShortRoundPrompt { module: usize, round: usize },
    ShortRoundSituation { module: usize, round: usize },
    PlaceholderOption { module: usize, round: usize },
}

impl std::fmt::Display for DensityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShortTitle => write!(f, "book title too short"),
            Self::ShortOpening => write!(f, "opening narrative too short"),
            Self::ShortObjective => write!(f, "learning objective too short"),
            Self::ThinIntel { bullets } => {
                write!(f, "background intel too thin ({bullets} bullets)")
            }
            Self::ShortDebrief => write!(f, "debrief too short"),
            Self::WrongRoundCount { module, rounds } => {
                write!(f, "module {module} has {rounds} rounds instead of 3")
            }
            Self::ShortRoundPrompt { module, round } => {
                write!(f, "module {module} round {round} prompt too short")
            }
            Self::ShortRoundSituation { module, round } => {
                write!(f, "module {module} round {round} situation too short")
            }
            Self::PlaceholderOption { module, round } => {
                write!(f, "module {module} round {round} has placeholder options")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(hits: usize, ratio: f64, bias: bool) -> GroundingReport {
        GroundingReport {
            hits,
            overlap_ratio: ratio,
            matched: vec![],
            missing: vec![],
            writing_bias: bias,
        }
    }

    #[test]
    fn pass_requires_all_three_conditions() {
        assert!(report(5, 0.2, false).passed());
        assert!(!report(3, 0.5, false).passed(), "hits floor");
        assert!(!report(10, 0.1, false).passed(), "ratio floor");
        assert!(!report(10, 0.5, true).passed(), "bias flag");
    }

    #[test]
    fn boundary_values_pass() {
        assert!(report(MIN_TERM_HITS, MIN_OVERLAP_RATIO, false).passed());
    }

    #[test]
    fn density_issue_messages_locate_the_problem() {
        let issue = DensityIssue::ShortRoundPrompt { module: 2, round: 1 };
        assert_eq!(issue.to_string(), "module 2 round 1 prompt too short");
    }
}
