//! External design-bridge tier.
//!
//! The bridge is a webhook that turns a render brief into finished HTML
//! with a heavier design system than the direct generative tier. It is
//! optional; failures fall through to the next tier.

use std::time::Duration;

use playforge_context::{evidence_digest, focused_snippet};
use playforge_core::error::RenderError;
use playforge_core::text::{clamp_chars, extract_html_block};
use serde_json::{Value, json};
use tracing::debug;

use crate::design::design_for;
use crate::job::RenderJob;
use crate::validate::validate_candidate;

const SNIPPET_CHARS: usize = 14_000;
const DIGEST_BULLETS: usize = 28;
const DIGEST_CHARS: usize = 12_000;

pub struct BridgeRenderer {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl BridgeRenderer {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Ask the bridge for one module document and gate the result.
    pub async fn render(&self, job: &RenderJob) -> Result<String, RenderError> {
        let payload = self.payload(job);
        debug!(module = %job.module.title, url = %self.url, "requesting bridge html");

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RenderError::BridgeFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RenderError::BridgeFailed(e.to_string()))?;
        let data: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if !status.is_success() {
            let detail = data
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("status {status}: {}", clamp_chars(&body, 220)));
            return Err(RenderError::BridgeFailed(detail));
        }

        let html = data
            .get("html")
            .and_then(Value::as_str)
            .and_then(extract_html_block)
            .ok_or_else(|| RenderError::BridgeFailed("response carried no html".into()))?;

        // Bridge output may legitimately use simpler controls.
        validate_candidate(&html, "bridge", true)?;
        Ok(html)
    }

    fn payload(&self, job: &RenderJob) -> Value {
        let module = &job.module;
        let design = design_for(&job.book_title, &module.title, job.module_index);
        let snippet = focused_snippet(&job.context_text, &job.terms, SNIPPET_CHARS);
        let digest = evidence_digest(
            &module.title,
            if snippet.is_empty() { &job.context_text } else { &snippet },
            &job.terms,
            DIGEST_BULLETS,
            DIGEST_CHARS,
        );
        json!({
            "task": "generate_playable_module_html",
            "book_id": job.book_id,
            "book_title": job.book_title,
            "module_index": job.module_index + 1,
            "module_count": job.module_count,
            "module": {
                "title": module.title,
                "situation": module.situation,
                "objective": job.objective,
                "opening": job.opening,
                "intel": job.intel.iter().take(6).collect::<Vec<_>>(),
            },
            "design": {
                "direction": design.direction.name,
                "mood": design.direction.mood,
                "typography": design.direction.typography,
                "palette": design.direction.palette,
                "mechanics": design.mechanics,
            },
            "navigation": {
                "next_href": job.next_href(),
                "prev_href": job.prev_href(),
                "hub_href": job.hub_href(),
            },
            "source_terms": job.terms.iter().take(16).cloned().collect::<Vec<_>>().join(", "),
            "context": {
                "focused": snippet,
                "digest": digest,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playforge_core::blueprint::{Blueprint, ModulePlan};

    fn job() -> RenderJob {
        let blueprint = Blueprint {
            book_title: "The Fiscal Collapse".into(),
            modules: vec![ModulePlan { title: "The Levy".into(), ..Default::default() }],
            ..Default::default()
        };
        RenderJob::from_blueprint(
            &blueprint,
            "book-1",
            0,
            &["m-1".into()],
            "The grain levy was doubled.",
            &["grain".into(), "levy".into()],
        )
    }

    #[test]
    fn payload_names_the_task_and_module() {
        let renderer = BridgeRenderer::new("http://localhost:1", 180);
        let payload = renderer.payload(&job());
        assert_eq!(payload["task"], "generate_playable_module_html");
        assert_eq!(payload["module_index"], 1);
        assert_eq!(payload["module"]["title"], "The Levy");
        assert!(payload["design"]["mechanics"].as_array().unwrap().len() == 4);
        assert_eq!(payload["navigation"]["hub_href"], "/books/book-1.html");
    }

    #[tokio::test]
    async fn unreachable_bridge_is_a_bridge_failure() {
        let renderer = BridgeRenderer::new("http://127.0.0.1:9/none", 1);
        let err = renderer.render(&job()).await.unwrap_err();
        assert!(matches!(err, RenderError::BridgeFailed(_)));
    }
}
