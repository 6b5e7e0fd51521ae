//! Built-in context providers: arXiv abstracts, generic URL fetch, and
//! topic lookup. A context task resolves one reference (URL or topic)
//! into full-content sources.

use async_trait::async_trait;
use playforge_core::error::CapabilityError;
use playforge_core::{Source, SourceOrigin, text};
use std::time::Duration;
use tracing::debug;

use crate::search::urlencode;
use crate::{Capability, CapabilityKind, CapabilityTask};

fn is_http_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

fn failed(e: impl std::fmt::Display) -> CapabilityError {
    CapabilityError::AllProvidersFailed { kind: "context".into(), last_error: e.to_string() }
}

fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent("playforge/0.1 (https://github.com/playforge/playforge)")
        .build()
        .unwrap_or_default()
}

/// Pull the arXiv id out of an abs/pdf URL, if any.
fn arxiv_id(reference: &str) -> Option<String> {
    let marker = reference.find("arxiv.org/")?;
    let rest = &reference[marker + "arxiv.org/".len()..];
    let rest = rest.strip_prefix("abs/").or_else(|| rest.strip_prefix("pdf/"))?;
    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '/'))
        .collect();
    let id = id.trim_end_matches(".pdf").trim_matches('/').to_string();
    if id.is_empty() { None } else { Some(id) }
}

/// Extract `(title, summary)` pairs from an arXiv Atom feed without an
/// XML dependency; entries are well-formed and flat.
fn parse_arxiv_atom(atom: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut rest = atom;
    while let Some(start) = rest.find("<entry>") {
        let Some(end) = rest[start..].find("</entry>") else { break };
        let entry = &rest[start..start + end];
        let title = tag_text(entry, "title").unwrap_or_default();
        let summary = tag_text(entry, "summary").unwrap_or_default();
        if !title.is_empty() {
            entries.push((title, summary));
        }
        rest = &rest[start + end + "</entry>".len()..];
    }
    entries
}

fn tag_text(fragment: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = fragment.find(&open)? + open.len();
    let end = fragment[start..].find(&close)? + start;
    Some(text::collapse_whitespace(&fragment[start..end]))
}

/// arXiv abstracts via the export API.
pub struct ArxivContext {
    client: reqwest::Client,
}

impl ArxivContext {
    pub fn new(timeout_secs: u64) -> Self {
        Self { client: http_client(timeout_secs) }
    }
}

#[async_trait]
impl Capability for ArxivContext {
    fn id(&self) -> &str {
        "arxiv-context"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Context
    }
    fn label(&self) -> &str {
        "arXiv abstract fetch"
    }

    fn supports(&self, task: &CapabilityTask) -> bool {
        matches!(task, CapabilityTask::Context { reference } if arxiv_id(reference).is_some())
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Context { reference } = task else {
            return Ok(vec![]);
        };
        let id = arxiv_id(reference)
            .ok_or_else(|| failed(format!("not an arXiv reference: {reference}")))?;
        let url = format!("http://export.arxiv.org/api/query?id_list={id}&max_results=1");
        let atom = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(failed)?
            .text()
            .await
            .map_err(failed)?;

        Ok(parse_arxiv_atom(&atom)
            .into_iter()
            .map(|(title, summary)| {
                Source::new(title, Some(reference.clone()), "", &summary, SourceOrigin::Enrichment)
            })
            .collect())
    }
}

/// Generic URL fetch: HTML is stripped to text, anything else is taken
/// verbatim when it decodes as text.
pub struct UrlFetchContext {
    client: reqwest::Client,
}

impl UrlFetchContext {
    pub fn new(timeout_secs: u64) -> Self {
        Self { client: http_client(timeout_secs) }
    }
}

#[async_trait]
impl Capability for UrlFetchContext {
    fn id(&self) -> &str {
        "url-fetch-context"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Context
    }
    fn label(&self) -> &str {
        "Generic URL fetch"
    }

    fn supports(&self, task: &CapabilityTask) -> bool {
        matches!(task, CapabilityTask::Context { reference } if is_http_url(reference))
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Context { reference } = task else {
            return Ok(vec![]);
        };
        let response = self.client.get(reference).send().await.map_err(failed)?;
        if !response.status().is_success() {
            return Err(failed(format!("fetch returned status {}", response.status())));
        }
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let body = response.text().await.map_err(failed)?;

        let (title, content) = if content_type.contains("html") || body.trim_start().starts_with('<')
        {
            let title = tag_text(&body, "title").unwrap_or_else(|| reference.clone());
            (title, text::strip_html(&body))
        } else {
            (reference.clone(), body)
        };
        if content.trim().is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![Source::new(title, Some(reference.clone()), "", &content, SourceOrigin::Url)])
    }
}

/// Topic lookup: non-URL references resolve through the Wikipedia page
/// summary endpoint, English then Chinese.
pub struct TopicLookupContext {
    client: reqwest::Client,
}

impl TopicLookupContext {
    pub fn new(timeout_secs: u64) -> Self {
        Self { client: http_client(timeout_secs) }
    }
}

#[async_trait]
impl Capability for TopicLookupContext {
    fn id(&self) -> &str {
        "topic-lookup-context"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Context
    }
    fn label(&self) -> &str {
        "Encyclopedia topic summary"
    }

    fn supports(&self, task: &CapabilityTask) -> bool {
        matches!(task, CapabilityTask::Context { reference } if !is_http_url(reference))
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Context { reference } = task else {
            return Ok(vec![]);
        };
        let mut last_error = String::from("no summary found");
        for lang in ["en", "zh"] {
            let url = format!(
                "https://{lang}.wikipedia.org/api/rest_v1/page/summary/{}",
                urlencode(reference)
            );
            let response = match self.client.get(&url).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            };
            if !response.status().is_success() {
                debug!(%lang, status = %response.status(), "topic summary miss");
                continue;
            }
            let json: serde_json::Value = match response.json().await {
                Ok(j) => j,
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            };
            let extract = json["extract"].as_str().unwrap_or("").trim();
            if extract.is_empty() {
                continue;
            }
            let title = json["title"].as_str().unwrap_or(reference);
            let page_url = json["content_urls"]["desktop"]["page"].as_str().map(str::to_string);
            return Ok(vec![Source::new(title, page_url, "", extract, SourceOrigin::Enrichment)]);
        }
        Err(failed(last_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arxiv_id_extraction() {
        assert_eq!(arxiv_id("https://arxiv.org/abs/2401.01234").as_deref(), Some("2401.01234"));
        assert_eq!(arxiv_id("https://arxiv.org/pdf/2401.01234.pdf").as_deref(), Some("2401.01234"));
        assert_eq!(arxiv_id("https://arxiv.org/abs/hep-th/9901001").as_deref(), Some("hep-th/9901001"));
        assert!(arxiv_id("https://example.org/abs/123").is_none());
    }

    #[test]
    fn atom_parsing_pulls_title_and_summary() {
        let atom = r#"<feed><entry>
            <title>Scaling laws for
              decision games</title>
            <summary>  We study how play complexity scales.  </summary>
        </entry></feed>"#;
        let entries = parse_arxiv_atom(atom);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "Scaling laws for decision games");
        assert_eq!(entries[0].1, "We study how play complexity scales.");
    }

    #[test]
    fn support_routing_between_providers() {
        let url_task = CapabilityTask::Context { reference: "https://example.org/page".into() };
        let arxiv_task = CapabilityTask::Context { reference: "https://arxiv.org/abs/2401.1".into() };
        let topic_task = CapabilityTask::Context { reference: "Roman fiscal policy".into() };

        let arxiv = ArxivContext::new(18);
        let url = UrlFetchContext::new(18);
        let topic = TopicLookupContext::new(18);

        assert!(arxiv.supports(&arxiv_task));
        assert!(!arxiv.supports(&url_task));
        assert!(url.supports(&url_task));
        assert!(url.supports(&arxiv_task), "url fetch is the arXiv fallback");
        assert!(!url.supports(&topic_task));
        assert!(topic.supports(&topic_task));
        assert!(!topic.supports(&url_task));
    }
}
