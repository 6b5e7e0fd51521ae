//! Blueprint synthesis: generate, normalize, gate, retry once. Backend
//! failures degrade to the deterministic blueprint; quality rejections
//! are hard errors.

use playforge_context::focused_snippet;
use playforge_core::backend::{GenerationRequest, GenerativeBackend};
use playforge_core::error::{BackendError, Error, QualityError};
use playforge_core::{Blueprint, Context};
use tracing::{info, warn};

use crate::fallback::fallback_blueprint;
use crate::normalize::normalize_blueprint;
use crate::prompt::{BLUEPRINT_SYSTEM, RetryHints, build_blueprint_prompt};
use crate::quality::{assess_grounding, find_density_issue};

const SNIPPET_CHARS: usize = 7_200;
const MAX_TOKENS: u32 = 3_200;
const TIMEOUT_SECS: u64 = 120;
const HINT_MISSING: usize = 12;
const HINT_MATCHED: usize = 8;

/// Produce a normalized, quality-gated blueprint.
///
/// One strict retry after a rejected first draft; a second rejection is a
/// hard error carrying the failing scores. Without a configured backend,
/// or when the backend itself keeps failing, the deterministic fallback
/// is used instead.
pub async fn synthesize_blueprint(
    backend: &dyn GenerativeBackend,
    context: &Context,
    terms: &[String],
    module_count: usize,
) -> Result<Blueprint, Error> {
    if !backend.is_configured() {
        warn!("no generative backend configured, using deterministic blueprint");
        return Ok(fallback_blueprint(context, terms, module_count));
    }

    let snippet = focused_snippet(&context.text, terms, SNIPPET_CHARS);
    let mut hints: Option<RetryHints> = None;
    let mut last_rejection: Option<QualityError> = None;

    for attempt in 0..2 {
        let prompt =
            build_blueprint_prompt(context, &snippet, terms, module_count, hints.as_ref());
        let request = GenerationRequest::new("blueprint", BLUEPRINT_SYSTEM, prompt)
            .max_tokens(MAX_TOKENS)
            .timeout_secs(TIMEOUT_SECS);

        let raw = match backend.generate(&request).await {
            Ok(text) => text,
            Err(BackendError::NotConfigured(_)) => {
                warn!("backend chain empty, using deterministic blueprint");
                return Ok(fallback_blueprint(context, terms, module_count));
            }
            Err(e) if attempt == 0 && e.is_retryable() => {
                warn!(error = %e, "blueprint generation failed, retrying");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "backend kept failing, using deterministic blueprint");
                return Ok(fallback_blueprint(context, terms, module_count));
            }
        };

        let parsed = match parse_blueprint(&raw) {
            Ok(blueprint) => blueprint,
            Err(e) => {
                warn!(attempt, error = %e, "blueprint response malformed");
                last_rejection = Some(QualityError::MalformedResponse(e.to_string()));
                hints = Some(RetryHints {
                    density_issue: Some("answer was not a valid JSON blueprint".into()),
                    ..Default::default()
                });
                continue;
            }
        };

        let blueprint = normalize_blueprint(parsed, &context.title, module_count);
        let report = assess_grounding(&blueprint, terms, &context.text);
        let density = find_density_issue(&blueprint);

        if report.passed() && density.is_none() {
            info!(
                attempt,
                hits = report.hits,
                ratio = format!("{:.3}", report.overlap_ratio),
                "blueprint accepted"
            );
            return Ok(blueprint);
        }

        warn!(
            attempt,
            hits = report.hits,
            ratio = format!("{:.3}", report.overlap_ratio),
            density = %density.as_ref().map(ToString::to_string).unwrap_or_default(),
            "blueprint rejected"
        );
        last_rejection = Some(match &density {
            Some(issue) if report.passed() => QualityError::LowDensity(issue.to_string()),
            _ => QualityError::BlueprintRejected {
                overlap_ratio: report.overlap_ratio,
                hits: report.hits,
            },
        });
        hints = Some(RetryHints {
            missing_terms: report.missing.iter().take(HINT_MISSING).cloned().collect(),
            matched_terms: report.matched.iter().take(HINT_MATCHED).cloned().collect(),
            density_issue: density.map(|issue| issue.to_string()),
        });
    }

    Err(last_rejection
        .unwrap_or(QualityError::MalformedResponse("no blueprint produced".into()))
        .into())
}

fn parse_blueprint(raw: &str) -> Result<Blueprint, serde_json::Error> {
    let value = playforge_core::text::extract_json_block(raw)
        .unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::dense_blueprint;
    use async_trait::async_trait;
    use playforge_core::{Source, SourceOrigin};
    use std::sync::Mutex;

    struct ScriptedBackend {
        responses: Mutex<Vec<Result<String, BackendError>>>,
        prompts: Mutex<Vec<String>>,
        configured: bool,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, BackendError>>) -> Self {
            Self { responses: Mutex::new(responses), prompts: Mutex::new(vec![]), configured: true }
        }

        fn unconfigured() -> Self {
            Self { responses: Mutex::new(vec![]), prompts: Mutex::new(vec![]), configured: false }
        }
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }
        fn is_configured(&self) -> bool {
            self.configured
        }
        async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(BackendError::EmptyContent("script exhausted".into()));
            }
            responses.remove(0)
        }
    }

    fn context() -> Context {
        let text = "The grain levy was doubled. Treasury reserves collapsed. Coin debasement \
                    followed. Riots closed the eastern market.";
        Context::new(
            "The Fiscal Collapse",
            text.into(),
            vec![Source::new("chronicle", None, "", text, SourceOrigin::Text)],
        )
    }

    fn terms() -> Vec<String> {
        ["grain", "levy", "treasury", "debasement"].iter().map(|s| s.to_string()).collect()
    }

    fn good_json() -> String {
        serde_json::to_string(&dense_blueprint()).unwrap()
    }

    #[tokio::test]
    async fn accepts_a_grounded_first_draft() {
        let backend = ScriptedBackend::new(vec![Ok(good_json())]);
        let blueprint = synthesize_blueprint(&backend, &context(), &terms(), 1).await.unwrap();
        assert_eq!(blueprint.book_title, "The Fiscal Collapse");
        assert_eq!(backend.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_once_with_hints_then_accepts() {
        let ungrounded = r#"{"book_title":"Generic Adventure Story","opening_narrative":"x","modules":[]}"#;
        let backend = ScriptedBackend::new(vec![Ok(ungrounded.into()), Ok(good_json())]);

        let blueprint = synthesize_blueprint(&backend, &context(), &terms(), 1).await.unwrap();
        assert_eq!(blueprint.modules.len(), 1);

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("previous draft was rejected"));
        assert!(prompts[1].contains("grain"));
    }

    #[tokio::test]
    async fn two_rejections_are_a_hard_error() {
        let bad = r#"{"book_title":"Generic Adventure Story","modules":[]}"#;
        let backend = ScriptedBackend::new(vec![Ok(bad.into()), Ok(bad.into())]);

        let err = synthesize_blueprint(&backend, &context(), &terms(), 1).await.unwrap_err();
        match err {
            Error::Quality(QualityError::BlueprintRejected { hits, .. }) => assert_eq!(hits, 0),
            other => panic!("expected BlueprintRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_retries_then_errors() {
        let backend =
            ScriptedBackend::new(vec![Ok("no json at all".into()), Ok("still prose".into())]);
        let err = synthesize_blueprint(&backend, &context(), &terms(), 1).await.unwrap_err();
        assert!(matches!(err, Error::Quality(QualityError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn unconfigured_backend_uses_fallback() {
        let backend = ScriptedBackend::unconfigured();
        let blueprint = synthesize_blueprint(&backend, &context(), &terms(), 2).await.unwrap();
        assert_eq!(blueprint.modules.len(), 2);
        assert!(backend.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_chain_exhaustion_falls_back() {
        let backend = ScriptedBackend::new(vec![Err(BackendError::NotConfigured("none".into()))]);
        let blueprint = synthesize_blueprint(&backend, &context(), &terms(), 1).await.unwrap();
        assert!(!blueprint.modules.is_empty());
    }

    #[tokio::test]
    async fn repeated_backend_failures_fall_back() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Network("connection reset".into())),
            Err(BackendError::Network("connection reset".into())),
        ]);
        let blueprint = synthesize_blueprint(&backend, &context(), &terms(), 2).await.unwrap();
        assert_eq!(blueprint.book_title, "The Fiscal Collapse");
        assert_eq!(blueprint.modules.len(), 2);
        assert_eq!(backend.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_retryable_failure_falls_back_without_retry() {
        let backend =
            ScriptedBackend::new(vec![Err(BackendError::AuthenticationFailed("bad key".into()))]);
        let blueprint = synthesize_blueprint(&backend, &context(), &terms(), 1).await.unwrap();
        assert_eq!(blueprint.modules.len(), 1);
        assert_eq!(backend.prompts.lock().unwrap().len(), 1);
    }
}
