//! Generative HTML tier: one full attempt, one compacted retry with a
//! fix hint naming what the first candidate got wrong.

use playforge_context::{evidence_digest, extract_grounding_terms, focused_snippet};
use playforge_core::backend::{GenerationRequest, GenerativeBackend};
use playforge_core::error::Error;
use playforge_core::text::{clamp_chars, extract_html_block};
use tracing::{debug, warn};

use crate::design::design_for;
use crate::job::RenderJob;
use crate::validate::validate_candidate;

const HTML_SYSTEM: &str =
    "You are an elite frontend engineer. Return only one complete HTML document.";

const MAX_TOKENS: u32 = 5_600;
const TIMEOUT_SECS: u64 = 120;
const TEMPERATURE: f32 = 0.85;

const FULL_SNIPPET_CHARS: usize = 9_000;
const FULL_DIGEST_BULLETS: usize = 24;
const FULL_DIGEST_CHARS: usize = 9_000;
const COMPACT_CONTEXT_CHARS: usize = 3_600;
const PROMPT_TERM_LIMIT: usize = 12;

/// Render one module through the generative backend.
pub async fn render_generative(
    backend: &dyn GenerativeBackend,
    job: &RenderJob,
) -> Result<String, Error> {
    match attempt(backend, job, &job.context_text, None).await {
        Ok(html) => Ok(html),
        Err(first) => {
            warn!(module = %job.module.title, error = %first, "generative html retrying with compact context");
            let compact = clamp_chars(&job.context_text, COMPACT_CONTEXT_CHARS);
            let hint = format!(
                "Previous output invalid: {first}. Generate a richer non-template interaction \
                 system with fully populated content."
            );
            attempt(backend, job, &compact, Some(&hint)).await
        }
    }
}

async fn attempt(
    backend: &dyn GenerativeBackend,
    job: &RenderJob,
    context_text: &str,
    fix_hint: Option<&str>,
) -> Result<String, Error> {
    let prompt = build_module_prompt(job, context_text, fix_hint);
    debug!(module = %job.module.title, prompt_chars = prompt.chars().count(), "rendering module html");

    let request = GenerationRequest::new("module-html", HTML_SYSTEM, prompt)
        .max_tokens(MAX_TOKENS)
        .temperature(TEMPERATURE)
        .timeout_secs(TIMEOUT_SECS);
    let content = backend.generate(&request).await?;

    let html = extract_html_block(&content).unwrap_or_default();
    validate_candidate(&html, "generative", false)?;
    Ok(html)
}

fn build_module_prompt(job: &RenderJob, context_text: &str, fix_hint: Option<&str>) -> String {
    let module = &job.module;
    let design = design_for(&job.book_title, &module.title, job.module_index);

    let focus = format!(
        "{}\n{}\n{}\n{}",
        module.title, module.situation, job.objective, job.opening
    );
    let focus_terms = extract_grounding_terms(&focus, PROMPT_TERM_LIMIT);
    let snippet = focused_snippet(context_text, &focus_terms, FULL_SNIPPET_CHARS);
    let digest = evidence_digest(
        &module.title,
        if snippet.is_empty() { context_text } else { &snippet },
        &job.terms,
        FULL_DIGEST_BULLETS,
        FULL_DIGEST_CHARS,
    );
    let source_terms = job
        .terms
        .iter()
        .take(PROMPT_TERM_LIMIT)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let intel = module_intel(job);
    let rounds = rounds_digest(job);

    let mut lines: Vec<String> = vec![
        "Create one complete single-file HTML learning mission page.".into(),
        "Return: one complete single-file HTML document (CSS + JS inline).".into(),
        "Do not output markdown, code fences, or explanations.".into(),
        String::new(),
        "Hard requirements:".into(),
        "- Premium visual direction, immersive and distinct. Avoid generic quiz-card style.".into(),
        "- Output only the content experience canvas. No app shell, sidebars, or settings chrome.".into(),
        "- Forbidden: rigid two-choice Option A/B layout and empty framed boxes.".into(),
        "- Include at least 3 different interaction mechanics.".into(),
        "- Include story framing, mission objective, real-time feedback, and phase summary.".into(),
        "- Desktop-first layout (1280px+), responsive on mobile as fallback.".into(),
        "- Every interactive element must sync displayed numbers/text/consequence copy in real time.".into(),
        "- No external JS libraries. Native DOM/SVG/Canvas/CSS only.".into(),
        "- Include a simple inline SVG illustration or diagram.".into(),
        "- Keep all content grounded to provided source evidence; no generic writing advice.".into(),
        "- Include at least 10 substantive content blocks and at least 8 grounded evidence notes.".into(),
        "- Each interaction zone must explain why the system responds, not only show raw values.".into(),
        "- Navigation buttons required with exact hrefs below.".into(),
        "- No placeholders: never output '-', 'TBD', 'TODO', or empty chips/cards.".into(),
        String::new(),
        "Navigation hrefs:".into(),
        format!("- NEXT_HREF: {}", job.next_href()),
        format!("- PREV_HREF: {}", job.prev_href()),
        format!("- HUB_HREF: {}", job.hub_href()),
        String::new(),
        "Creative direction:".into(),
        format!("- Direction: {}", design.direction.name),
        format!("- Mood: {}", design.direction.mood),
        format!("- Typography: {}", design.direction.typography),
        format!("- Palette: {}", design.direction.palette),
        format!("- Mechanics to include: {}", design.mechanics.join(" | ")),
        String::new(),
        "Module metadata:".into(),
        format!("- Book title: {}", job.book_title),
        format!("- Module title: {}", module.title),
        format!("- Module {} of {}", job.module_index + 1, job.module_count),
        format!("- Situation: {}", module.situation),
        format!("- Goal: {}", job.objective),
        format!("- Opening: {}", job.opening),
        format!("- Intel:\n{intel}"),
        format!("- Round seeds:\n{rounds}"),
        String::new(),
        format!(
            "Must-anchor source terms: {}",
            if source_terms.is_empty() { "(none)" } else { &source_terms }
        ),
    ];
    if let Some(hint) = fix_hint {
        lines.push(format!("Fix instruction from previous invalid attempt: {hint}"));
    }
    lines.push(String::new());
    lines.push("Chapter evidence digest (high-priority facts to cover):".into());
    lines.push(if digest.is_empty() { "(none)".into() } else { digest });
    lines.push(String::new());
    lines.push("Focused context snippet:".into());
    lines.push(if snippet.is_empty() {
        clamp_chars(context_text, FULL_SNIPPET_CHARS)
    } else {
        snippet
    });
    lines.join("\n")
}

fn module_intel(job: &RenderJob) -> String {
    let rows: Vec<String> = job.intel.iter().take(6).map(|line| format!("- {line}")).collect();
    if rows.is_empty() { "- (none)".into() } else { rows.join("\n") }
}

fn rounds_digest(job: &RenderJob) -> String {
    let rows: Vec<String> = job
        .module
        .rounds
        .iter()
        .enumerate()
        .map(|(index, round)| {
            let labels: Vec<&str> =
                round.options.iter().map(|option| option.label.as_str()).collect();
            format!(
                "Round {}: {}\nSituation: {}\nOptions: {}",
                index + 1,
                round.prompt,
                round.situation,
                if labels.is_empty() { "(none)".into() } else { labels.join(" | ") }
            )
        })
        .collect();
    if rows.is_empty() { "(none)".into() } else { rows.join("\n\n") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use playforge_core::blueprint::{Blueprint, ChoiceOption, Effects, ModulePlan, Round};
    use playforge_core::error::{BackendError, RenderError};
    use std::sync::Mutex;

    const RICH_HTML: &str = r#"<html><body class="mission-stage">
        <svg viewBox="0 0 10 10"><circle r="4"/></svg>
        <input type="range" min="0" max="100">
        <div class="timeline-track"></div>
        <script>
        slider.addEventListener("input", sync);
        stage.addEventListener("click", apply);
        requestAnimationFrame(tick);
        </script></body></html>"#;

    struct ScriptedBackend {
        responses: Mutex<Vec<Result<String, BackendError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, BackendError>>) -> Self {
            Self { responses: Mutex::new(responses), prompts: Mutex::new(vec![]) }
        }
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn job() -> RenderJob {
        let blueprint = Blueprint {
            book_title: "The Fiscal Collapse".into(),
            opening_narrative: "The treasury is empty.".into(),
            learning_objective: "Practice fiscal triage.".into(),
            background_intel: vec!["Grain reserves fell by half.".into()],
            modules: vec![ModulePlan {
                title: "The Levy".into(),
                situation: "The council is split.".into(),
                rounds: vec![Round {
                    prompt: "What is your call on the levy?".into(),
                    situation: "Advisors disagree sharply.".into(),
                    options: vec![ChoiceOption {
                        label: "Raise it".into(),
                        feedback: "Revenue climbs.".into(),
                        effects: Effects::default(),
                    }],
                }],
            }],
            debrief: "Levers interact.".into(),
        };
        RenderJob::from_blueprint(
            &blueprint,
            "book-1",
            0,
            &["m-1".into()],
            "The grain levy was doubled. Treasury reserves collapsed.",
            &["grain".into(), "levy".into()],
        )
    }

    #[tokio::test]
    async fn valid_first_attempt_needs_no_retry() {
        let backend = ScriptedBackend::new(vec![Ok(RICH_HTML.into())]);
        let html = render_generative(&backend, &job()).await.unwrap();
        assert!(html.contains("mission-stage"));
        assert_eq!(backend.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_candidate_triggers_compact_retry_with_hint() {
        let backend = ScriptedBackend::new(vec![
            Ok("<p>just a fragment</p>".into()),
            Ok(RICH_HTML.into()),
        ]);
        let html = render_generative(&backend, &job()).await.unwrap();
        assert!(html.contains("mission-stage"));

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Fix instruction from previous invalid attempt"));
    }

    #[tokio::test]
    async fn two_invalid_candidates_fail_with_the_rejection() {
        let backend = ScriptedBackend::new(vec![
            Ok("<p>nope</p>".into()),
            Ok("<p>still nope</p>".into()),
        ]);
        let err = render_generative(&backend, &job()).await.unwrap_err();
        assert!(matches!(err, Error::Render(RenderError::CandidateRejected { .. })));
    }

    #[tokio::test]
    async fn prompt_carries_design_and_grounding() {
        let backend = ScriptedBackend::new(vec![Ok(RICH_HTML.into())]);
        render_generative(&backend, &job()).await.unwrap();
        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Creative direction:"));
        assert!(prompts[0].contains("Must-anchor source terms: grain, levy"));
        assert!(prompts[0].contains("NEXT_HREF: /books/book-1.html"));
        assert!(prompts[0].contains("Round 1: What is your call on the levy?"));
    }
}
