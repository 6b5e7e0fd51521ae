//! Generative knowledge-pack synthesis with the deterministic fallback.
//!
//! Unlike blueprint synthesis this stage never fails the pipeline: any
//! backend or parse problem degrades to the evidence-built pack.

use playforge_context::{evidence_digest, extract_grounding_terms};
use playforge_core::Context;
use playforge_core::backend::{GenerationRequest, GenerativeBackend};
use playforge_core::knowledge::{KnowledgePack, QuizQuestion, SkillPoint, ThinkTankEntry};
use playforge_core::text::extract_json_block;
use serde::Deserialize;
use tracing::{info, warn};

use crate::fallback::fallback_pack;

const KNOWLEDGE_SYSTEM: &str = "You are a learning designer who distills source material into \
    reusable knowledge assets. You answer with a single strict JSON object and nothing else.";

const MAX_TOKENS: u32 = 3_600;
const TIMEOUT_SECS: u64 = 120;
const DIGEST_BULLETS: usize = 24;
const DIGEST_CHARS: usize = 9_000;
const PROMPT_TERMS: usize = 20;

/// Accepts both our field names and the camelCase vocabulary generative
/// models tend to echo back.
#[derive(Debug, Default, Deserialize)]
struct RawPack {
    #[serde(default, alias = "bookSummary", alias = "book_summary")]
    summary: String,
    #[serde(default, alias = "skillPoints", alias = "skill_points")]
    skills: Vec<SkillPoint>,
    #[serde(default, alias = "thinkTankEntries", alias = "think_tank_entries")]
    entries: Vec<ThinkTankEntry>,
    #[serde(default, alias = "quizQuestions", alias = "battleQuestions")]
    questions: Vec<QuizQuestion>,
}

/// Produce the document's knowledge pack.
pub async fn synthesize_knowledge(
    backend: &dyn GenerativeBackend,
    context: &Context,
    terms: &[String],
    module_count: usize,
) -> KnowledgePack {
    if !backend.is_configured() {
        info!("no generative backend configured, using deterministic knowledge pack");
        return fallback_pack(context, terms);
    }

    let prompt = build_knowledge_prompt(context, terms, module_count);
    let request = GenerationRequest::new("knowledge-pack", KNOWLEDGE_SYSTEM, prompt)
        .max_tokens(MAX_TOKENS)
        .timeout_secs(TIMEOUT_SECS);

    let raw = match backend.generate(&request).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "knowledge generation failed, using deterministic pack");
            return fallback_pack(context, terms);
        }
    };

    let parsed: Option<RawPack> =
        extract_json_block(&raw).and_then(|value| serde_json::from_value(value).ok());
    let pack = match parsed {
        Some(raw) => KnowledgePack {
            summary: raw.summary,
            skills: raw.skills,
            entries: raw.entries,
            questions: raw.questions,
        }
        .normalized(),
        None => {
            warn!("knowledge response malformed, using deterministic pack");
            return fallback_pack(context, terms);
        }
    };

    if pack.is_empty() {
        warn!("knowledge response empty after normalization, using deterministic pack");
        return fallback_pack(context, terms);
    }
    info!(
        skills = pack.skills.len(),
        entries = pack.entries.len(),
        questions = pack.questions.len(),
        "knowledge pack synthesized"
    );
    pack
}

fn build_knowledge_prompt(context: &Context, terms: &[String], module_count: usize) -> String {
    let focus_terms = if terms.is_empty() {
        extract_grounding_terms(&context.text, PROMPT_TERMS)
    } else {
        terms.iter().take(PROMPT_TERMS).cloned().collect()
    };
    let digest =
        evidence_digest(&context.title, &context.text, &focus_terms, DIGEST_BULLETS, DIGEST_CHARS);

    format!(
        "Distill the material titled \"{title}\" into a knowledge pack for a {module_count}-module \
         playable experience.\n\n\
         Ground every field in the source evidence below; use its concrete terms and figures. \
         Module hints are 1-based module numbers or module-title fragments; omit them when \
         unsure.\n\n\
         Answer with one JSON object with exactly these keys:\n\
         {{\n\
           \"summary\": string (3-4 sentences covering the whole document),\n\
           \"skills\": [{{\"name\", \"description\", \"category\", \"keywords\": [string], \
         \"difficulty\": 1-5, \"module_hint\"?}}] (6-12 items),\n\
           \"entries\": [{{\"term\", \"title\", \"summary\", \"insight\", \"tags\": [string], \
         \"related_terms\": [string], \"module_hint\"?}}] (8-20 items),\n\
           \"questions\": [{{\"prompt\", \"options\": [4 strings], \"answer_index\": 0-3, \
         \"explanation\", \"entry_id\"?, \"module_hint\"?}}] (6-14 items)\n\
         }}\n\n\
         Key source vocabulary: {vocabulary}\n\n\
         Source evidence:\n{digest}",
        title = context.title,
        vocabulary = focus_terms.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use playforge_core::error::BackendError;
    use std::sync::Mutex;

    struct ScriptedBackend {
        responses: Mutex<Vec<Result<String, BackendError>>>,
        configured: bool,
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }
        fn is_configured(&self) -> bool {
            self.configured
        }
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, BackendError> {
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn context() -> Context {
        Context::new(
            "The Fiscal Collapse",
            "The grain levy was doubled. Treasury reserves collapsed under the new levy.".into(),
            vec![],
        )
    }

    fn terms() -> Vec<String> {
        vec!["grain".into(), "levy".into(), "treasury".into()]
    }

    const GOOD_PACK: &str = r#"{
        "summary": "A treasury buckles under a doubled grain levy.",
        "skills": [{"name": "Fiscal triage", "description": "Sequence levies against reserves.", "keywords": ["levy"], "difficulty": 3}],
        "entries": [{"term": "grain levy", "title": "Grain levy", "summary": "The levy was doubled in spring.", "insight": "Taxation has a lag.", "tags": ["fiscal"]}],
        "questions": [{"prompt": "What happened to the levy?", "options": ["Doubled", "Halved", "Abolished", "Unchanged"], "answer_index": 0, "explanation": "It was doubled."}]
    }"#;

    #[tokio::test]
    async fn parses_a_valid_pack() {
        let backend = ScriptedBackend {
            responses: Mutex::new(vec![Ok(GOOD_PACK.into())]),
            configured: true,
        };
        let pack = synthesize_knowledge(&backend, &context(), &terms(), 2).await;
        assert_eq!(pack.entries.len(), 1);
        assert_eq!(pack.entries[0].id, "grain-levy");
        assert_eq!(pack.questions[0].options.len(), 4);
        assert_eq!(pack.summary, "A treasury buckles under a doubled grain levy.");
    }

    #[tokio::test]
    async fn camel_case_vocabulary_is_accepted() {
        let camel = r#"{"bookSummary": "s", "skillPoints": [], "thinkTankEntries":
            [{"term": "levy", "title": "Levy", "summary": "doubled"}], "questions": []}"#;
        let backend =
            ScriptedBackend { responses: Mutex::new(vec![Ok(camel.into())]), configured: true };
        let pack = synthesize_knowledge(&backend, &context(), &terms(), 1).await;
        assert_eq!(pack.entries.len(), 1);
        assert_eq!(pack.summary, "s");
    }

    #[tokio::test]
    async fn malformed_response_degrades_to_fallback() {
        let backend = ScriptedBackend {
            responses: Mutex::new(vec![Ok("no json here".into())]),
            configured: true,
        };
        let pack = synthesize_knowledge(&backend, &context(), &terms(), 1).await;
        assert!(!pack.is_empty());
        assert!(pack.entries.iter().any(|e| e.term == "grain"));
    }

    #[tokio::test]
    async fn backend_error_degrades_to_fallback() {
        let backend = ScriptedBackend {
            responses: Mutex::new(vec![Err(BackendError::Timeout {
                timeout_secs: 120,
                context: "knowledge-pack".into(),
            })]),
            configured: true,
        };
        let pack = synthesize_knowledge(&backend, &context(), &terms(), 1).await;
        assert!(!pack.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_backend_skips_the_call() {
        let backend = ScriptedBackend { responses: Mutex::new(vec![]), configured: false };
        let pack = synthesize_knowledge(&backend, &context(), &terms(), 1).await;
        assert!(!pack.is_empty());
    }
}
