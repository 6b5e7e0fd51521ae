//! Built-in search providers: Wikipedia, Crossref, OpenAlex.
//!
//! Each returns listing-only sources (title, url, snippet); full content
//! arrives later through context enrichment.

use async_trait::async_trait;
use playforge_core::error::CapabilityError;
use playforge_core::{Source, SourceOrigin};
use std::time::Duration;
use tracing::debug;

use crate::{Capability, CapabilityKind, CapabilityTask};

fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent("playforge/0.1 (https://github.com/playforge/playforge)")
        .build()
        .unwrap_or_default()
}

async fn get_json(
    client: &reqwest::Client,
    url: &str,
) -> Result<serde_json::Value, CapabilityError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CapabilityError::AllProvidersFailed {
            kind: "search".into(),
            last_error: e.to_string(),
        })?;
    response
        .json()
        .await
        .map_err(|e| CapabilityError::AllProvidersFailed {
            kind: "search".into(),
            last_error: e.to_string(),
        })
}

/// Wikipedia opensearch in Chinese and English.
pub struct WikipediaSearch {
    client: reqwest::Client,
}

impl WikipediaSearch {
    pub fn new(timeout_secs: u64) -> Self {
        Self { client: http_client(timeout_secs) }
    }
}

/// Parse an opensearch reply: `[query, [titles], [descriptions], [urls]]`.
fn parse_opensearch(json: &serde_json::Value) -> Vec<Source> {
    let titles = json[1].as_array().cloned().unwrap_or_default();
    let descriptions = json[2].as_array().cloned().unwrap_or_default();
    let urls = json[3].as_array().cloned().unwrap_or_default();

    titles
        .iter()
        .enumerate()
        .filter_map(|(i, title)| {
            let title = title.as_str()?.trim();
            if title.is_empty() {
                return None;
            }
            Some(Source::new(
                title,
                urls.get(i).and_then(|u| u.as_str()).map(str::to_string),
                descriptions.get(i).and_then(|d| d.as_str()).unwrap_or(""),
                "",
                SourceOrigin::Search,
            ))
        })
        .collect()
}

#[async_trait]
impl Capability for WikipediaSearch {
    fn id(&self) -> &str {
        "wikipedia-search"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Search
    }
    fn label(&self) -> &str {
        "Wikipedia opensearch (zh + en)"
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Search { query, limit } = task else {
            return Ok(vec![]);
        };
        let per_lang = (*limit).clamp(1, 5);
        let mut sources = Vec::new();
        for lang in ["zh", "en"] {
            let url = format!(
                "https://{lang}.wikipedia.org/w/api.php?action=opensearch&search={}&limit={per_lang}&format=json",
                urlencode(query)
            );
            match get_json(&self.client, &url).await {
                Ok(json) => sources.extend(parse_opensearch(&json)),
                Err(e) => debug!(%lang, error = %e, "wikipedia lookup failed"),
            }
        }
        Ok(sources)
    }
}

/// Crossref scholarly works search.
pub struct CrossrefSearch {
    client: reqwest::Client,
}

impl CrossrefSearch {
    pub fn new(timeout_secs: u64) -> Self {
        Self { client: http_client(timeout_secs) }
    }
}

fn parse_crossref(json: &serde_json::Value) -> Vec<Source> {
    json["message"]["items"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let title = item["title"][0].as_str()?.trim();
            if title.is_empty() {
                return None;
            }
            let snippet = item["abstract"]
                .as_str()
                .map(playforge_core::text::strip_html)
                .unwrap_or_default();
            Some(Source::new(
                title,
                item["URL"].as_str().map(str::to_string),
                &snippet,
                "",
                SourceOrigin::Search,
            ))
        })
        .collect()
}

#[async_trait]
impl Capability for CrossrefSearch {
    fn id(&self) -> &str {
        "crossref-search"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Search
    }
    fn label(&self) -> &str {
        "Crossref scholarly works"
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Search { query, limit } = task else {
            return Ok(vec![]);
        };
        let rows = (*limit).clamp(1, 6);
        let url = format!("https://api.crossref.org/works?query={}&rows={rows}", urlencode(query));
        let json = get_json(&self.client, &url).await?;
        Ok(parse_crossref(&json))
    }
}

/// OpenAlex scholarly works search.
pub struct OpenAlexSearch {
    client: reqwest::Client,
}

impl OpenAlexSearch {
    pub fn new(timeout_secs: u64) -> Self {
        Self { client: http_client(timeout_secs) }
    }
}

fn parse_openalex(json: &serde_json::Value) -> Vec<Source> {
    json["results"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let title = item["display_name"].as_str().or_else(|| item["title"].as_str())?.trim();
            if title.is_empty() {
                return None;
            }
            let url = item["doi"]
                .as_str()
                .or_else(|| item["id"].as_str())
                .map(str::to_string);
            let snippet = item["host_venue"]["display_name"].as_str().unwrap_or("");
            Some(Source::new(title, url, snippet, "", SourceOrigin::Search))
        })
        .collect()
}

#[async_trait]
impl Capability for OpenAlexSearch {
    fn id(&self) -> &str {
        "openalex-search"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Search
    }
    fn label(&self) -> &str {
        "OpenAlex scholarly works"
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Search { query, limit } = task else {
            return Ok(vec![]);
        };
        let per_page = (*limit).clamp(1, 6);
        let url =
            format!("https://api.openalex.org/works?search={}&per_page={per_page}", urlencode(query));
        let json = get_json(&self.client, &url).await?;
        Ok(parse_openalex(&json))
    }
}

/// Minimal percent-encoding for query parameters.
pub(crate) fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(*byte as char)
            }
            b' ' => out.push_str("%20"),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
