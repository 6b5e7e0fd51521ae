//! Source material and the aggregated generation context.

use serde::{Deserialize, Serialize};

use crate::text::{MAX_CONTEXT_TEXT, MAX_SNIPPET, MAX_SOURCE_CONTENT, clamp_chars, collapse_whitespace};

/// Where a piece of source material came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Pasted or piped raw text.
    Text,
    /// A local file (plain text, HTML, EPUB, PDF via bridge).
    File,
    /// A fetched URL.
    Url,
    /// A search-provider result.
    Search,
    /// Context fetched while enriching search results.
    Enrichment,
}

impl SourceOrigin {
    /// True for material that arrived over the network.
    pub fn is_web(self) -> bool {
        matches!(self, Self::Url | Self::Search | Self::Enrichment)
    }
}

/// One normalized unit of source material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Short preview used in prompts and search listings.
    #[serde(default)]
    pub snippet: String,
    /// Full extracted content; empty for listing-only search hits.
    #[serde(default)]
    pub content: String,
    pub origin: SourceOrigin,
}

impl Source {
    /// Build a source with content and snippet clamped to their ceilings.
    pub fn new(
        title: impl Into<String>,
        url: Option<String>,
        snippet: &str,
        content: &str,
        origin: SourceOrigin,
    ) -> Self {
        let content = clamp_chars(content.trim(), MAX_SOURCE_CONTENT);
        let snippet = if snippet.trim().is_empty() {
            clamp_chars(&collapse_whitespace(&content), MAX_SNIPPET)
        } else {
            clamp_chars(&collapse_whitespace(snippet), MAX_SNIPPET)
        };
        Self {
            title: collapse_whitespace(&title.into()),
            url,
            snippet,
            content,
            origin,
        }
    }

    /// Key used for duplicate elimination: lowercased `(url, title)`.
    pub fn dedupe_key(&self) -> (String, String) {
        (
            self.url.as_deref().unwrap_or("").trim().to_lowercase(),
            self.title.trim().to_lowercase(),
        )
    }
}

/// Drop sources whose `(url, title)` key was already seen, keeping order.
pub fn dedupe_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = std::collections::HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.dedupe_key()))
        .collect()
}

/// The aggregated context a whole generation run works from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Working title for the experience.
    pub title: String,
    /// Concatenated source text, capped at [`MAX_CONTEXT_TEXT`] chars.
    pub text: String,
    pub sources: Vec<Source>,
}

impl Context {
    pub fn new(title: impl Into<String>, text: String, sources: Vec<Source>) -> Self {
        Self {
            title: title.into(),
            text: clamp_chars(&text, MAX_CONTEXT_TEXT),
            sources,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// True when any source arrived over the network.
    pub fn has_web_sources(&self) -> bool {
        self.sources.iter().any(|s| s.origin.is_web())
    }
}
