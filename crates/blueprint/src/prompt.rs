//! Prompt construction for blueprint synthesis.

use playforge_core::Context;
use playforge_core::blueprint::EFFECT_BOUND;

pub const BLUEPRINT_SYSTEM: &str = "You are a scenario designer who turns source material into \
    decision-driven learning experiences. You answer with a single strict JSON object and \
    nothing else: no prose, no markdown fences, no comments.";

/// Hints carried into the strict retry after a rejected first attempt.
#[derive(Debug, Clone, Default)]
pub struct RetryHints {
    /// Terms the first attempt failed to use.
    pub missing_terms: Vec<String>,
    /// Terms it did use, to keep.
    pub matched_terms: Vec<String>,
    /// Density problem, if that was the rejection reason.
    pub density_issue: Option<String>,
}

pub fn build_blueprint_prompt(
    context: &Context,
    snippet: &str,
    terms: &[String],
    module_count: usize,
    hints: Option<&RetryHints>,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Design a playable learning blueprint for the material titled \"{}\".\n\n",
        context.title
    ));
    prompt.push_str(&format!(
        "Structure: exactly {module_count} modules. Every module has exactly 3 rounds. Every \
         round offers 2-4 options; each option carries label, feedback, and integer effects \
         (stability, resource, progress) between -{EFFECT_BOUND} and {EFFECT_BOUND}.\n\n"
    ));
    prompt.push_str(
        "Ground every field in the source material below. Use its concrete terms, figures, and \
         events. Never emit filler like \"TBD\", \"N/A\", or \"coming soon\".\n\n",
    );

    if !terms.is_empty() {
        prompt.push_str("Key source vocabulary to weave in:\n");
        prompt.push_str(&terms.join(", "));
        prompt.push_str("\n\n");
    }

    if let Some(hints) = hints {
        prompt.push_str("Your previous draft was rejected. Fix it:\n");
        if !hints.missing_terms.is_empty() {
            prompt.push_str(&format!(
                "- It ignored these source terms; use them concretely: {}\n",
                hints.missing_terms.join(", ")
            ));
        }
        if !hints.matched_terms.is_empty() {
            prompt.push_str(&format!(
                "- Keep building on these terms it already used: {}\n",
                hints.matched_terms.join(", ")
            ));
        }
        if let Some(issue) = &hints.density_issue {
            prompt.push_str(&format!("- Structural problem to repair: {issue}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Answer with one JSON object with exactly these keys:\n\
         {\n\
           \"book_title\": string,\n\
           \"opening_narrative\": string (at least 72 chars),\n\
           \"learning_objective\": string (at least 36 chars),\n\
           \"background_intel\": [string, ...] (at least 4 factual bullets),\n\
           \"modules\": [{\"title\", \"situation\", \"rounds\": [{\"prompt\", \"situation\", \
         \"options\": [{\"label\", \"feedback\", \"effects\": {\"stability\", \"resource\", \
         \"progress\"}}]}]}],\n\
           \"debrief\": string (at least 60 chars)\n\
         }\n\n",
    );

    prompt.push_str("Source material:\n---\n");
    prompt.push_str(snippet);
    prompt.push_str("\n---\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        Context::new("The Fiscal Collapse", "text".into(), vec![])
    }

    #[test]
    fn prompt_names_structure_and_bounds() {
        let prompt = build_blueprint_prompt(&context(), "snippet", &["grain".into()], 3, None);
        assert!(prompt.contains("exactly 3 modules"));
        assert!(prompt.contains("between -12 and 12"));
        assert!(prompt.contains("grain"));
        assert!(prompt.contains("snippet"));
    }

    #[test]
    fn retry_hints_are_injected() {
        let hints = RetryHints {
            missing_terms: vec!["levy".into()],
            matched_terms: vec!["grain".into()],
            density_issue: Some("debrief too short".into()),
        };
        let prompt = build_blueprint_prompt(&context(), "s", &[], 2, Some(&hints));
        assert!(prompt.contains("previous draft was rejected"));
        assert!(prompt.contains("levy"));
        assert!(prompt.contains("debrief too short"));
    }
}
