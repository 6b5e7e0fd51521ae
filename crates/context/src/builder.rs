//! Context assembly: raw inputs → one normalized [`Context`].

use playforge_capability::{CapabilityRegistry, CapabilityTask};
use playforge_capability::ingest::preflight_file;
use playforge_core::error::{Error, InputError};
use playforge_core::text::MAX_CONTEXT_TEXT;
use playforge_core::{Context, Source, SourceOrigin, dedupe_sources};
use std::path::PathBuf;
use tracing::{debug, warn};

/// How many search hits get content enrichment.
const MAX_ENRICHED_RESULTS: usize = 5;

/// The raw material one generation run starts from. Any combination of
/// fields may be set; all of them empty is an error.
#[derive(Debug, Clone, Default)]
pub struct SourceInputs {
    /// Topic to research via search capabilities.
    pub topic: Option<String>,
    /// Pasted or piped text.
    pub text: Option<String>,
    pub files: Vec<PathBuf>,
    pub urls: Vec<String>,
}

impl SourceInputs {
    pub fn is_empty(&self) -> bool {
        self.topic.as_deref().unwrap_or("").trim().is_empty()
            && self.text.as_deref().unwrap_or("").trim().is_empty()
            && self.files.is_empty()
            && self.urls.is_empty()
    }
}

/// Assemble the run context from the given inputs.
///
/// Files and URLs are hard inputs: a failure there fails the run. Search
/// and enrichment are best-effort. The result always has non-empty text.
pub async fn build_context(
    inputs: &SourceInputs,
    registry: &CapabilityRegistry,
    search_limit: usize,
    max_file_bytes: usize,
) -> Result<Context, Error> {
    if inputs.is_empty() {
        return Err(InputError::EmptyContext.into());
    }

    let mut sources: Vec<Source> = Vec::new();

    if let Some(text) = inputs.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let title = inputs.topic.as_deref().unwrap_or("Pasted material");
        sources.push(Source::new(title, None, "", text, SourceOrigin::Text));
    }

    for path in &inputs.files {
        preflight_file(path, max_file_bytes)?;
        let task = CapabilityTask::Ingest { path: path.clone() };
        let extracted = registry.resolve_first(&task).await.map_err(Error::Capability)?;
        sources.extend(extracted);
    }

    for url in &inputs.urls {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(InputError::InvalidUrl(url.clone()).into());
        }
        let task = CapabilityTask::Context { reference: url.clone() };
        let fetched = registry.resolve_first(&task).await.map_err(Error::Capability)?;
        sources.extend(fetched);
    }

    if let Some(topic) = inputs.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let hits = registry.search(topic, search_limit).await;
        debug!(count = hits.len(), "search hits for topic");

        // Enrich the first few hits with full content; misses are fine.
        let mut enriched = 0usize;
        for hit in &hits {
            if enriched >= MAX_ENRICHED_RESULTS {
                break;
            }
            let Some(url) = hit.url.clone() else { continue };
            let task = CapabilityTask::Context { reference: url };
            match registry.resolve_first(&task).await {
                Ok(full) => {
                    sources.extend(full);
                    enriched += 1;
                }
                Err(e) => warn!(title = %hit.title, error = %e, "enrichment failed"),
            }
        }
        sources.extend(hits);

        // The topic itself is also a lookup reference.
        if sources.iter().all(|s| s.content.trim().is_empty()) {
            let task = CapabilityTask::Context { reference: topic.to_string() };
            if let Ok(looked_up) = registry.resolve_first(&task).await {
                sources.extend(looked_up);
            }
        }
    }

    let sources = dedupe_sources(sources);
    let title = inputs
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| sources.first().map(|s| s.title.clone()))
        .unwrap_or_else(|| "Untitled experience".to_string());

    let text = aggregate_text(&sources);
    if text.trim().is_empty() {
        return Err(InputError::EmptyContext.into());
    }
    Ok(Context::new(title, text, sources))
}

/// Join source content into one titled document, snippets standing in
/// for listing-only sources.
fn aggregate_text(sources: &[Source]) -> String {
    let mut out = String::new();
    for source in sources {
        let body = if !source.content.trim().is_empty() {
            source.content.trim()
        } else if !source.snippet.trim().is_empty() {
            source.snippet.trim()
        } else {
            continue;
        };
        out.push_str("## ");
        out.push_str(&source.title);
        out.push('\n');
        out.push_str(body);
        out.push_str("\n\n");
        if out.chars().count() >= MAX_CONTEXT_TEXT {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use playforge_capability::{Capability, CapabilityKind};
    use playforge_core::error::CapabilityError;
    use std::io::Write as _;
    use std::sync::Arc;

    struct StubSearch;

    #[async_trait]
    impl Capability for StubSearch {
        fn id(&self) -> &str {
            "stub-search"
        }
        fn kind(&self) -> CapabilityKind {
            CapabilityKind::Search
        }
        fn label(&self) -> &str {
            "stub"
        }
        async fn run(&self, _task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
            Ok(vec![Source::new(
                "Search hit",
                Some("https://example.org/hit".into()),
                "A short abstract about the levy.",
                "",
                SourceOrigin::Search,
            )])
        }
    }

    struct StubContext;

    #[async_trait]
    impl Capability for StubContext {
        fn id(&self) -> &str {
            "stub-context"
        }
        fn kind(&self) -> CapabilityKind {
            CapabilityKind::Context
        }
        fn label(&self) -> &str {
            "stub"
        }
        async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
            let CapabilityTask::Context { reference } = task else { return Ok(vec![]) };
            Ok(vec![Source::new(
                "Fetched page",
                Some(reference.clone()),
                "",
                "Full fetched body about the grain levy.",
                SourceOrigin::Url,
            )])
        }
    }

    fn registry() -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubSearch));
        registry.register(Arc::new(StubContext));
        registry.register(Arc::new(playforge_capability::ingest::TextFileIngest));
        registry
    }

    #[tokio::test]
    async fn empty_inputs_are_rejected() {
        let inputs = SourceInputs::default();
        let err = build_context(&inputs, &registry(), 12, 1024).await.unwrap_err();
        assert!(matches!(err, Error::Input(InputError::EmptyContext)));
    }

    #[tokio::test]
    async fn pasted_text_becomes_a_source() {
        let inputs = SourceInputs {
            text: Some("The levy failed and the treasury emptied.".into()),
            ..Default::default()
        };
        let context = build_context(&inputs, &registry(), 12, 1024).await.unwrap();
        assert_eq!(context.sources.len(), 1);
        assert!(context.text.contains("treasury"));
        assert!(!context.has_web_sources());
    }

    #[tokio::test]
    async fn files_are_ingested_and_titles_flow_from_topic() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "Chronicle of the grain riots.").unwrap();

        let inputs = SourceInputs {
            topic: Some("Grain crisis".into()),
            files: vec![file.path().to_path_buf()],
            ..Default::default()
        };
        let context = build_context(&inputs, &registry(), 12, 1 << 20).await.unwrap();
        assert_eq!(context.title, "Grain crisis");
        assert!(context.text.contains("grain riots"));
    }

    #[tokio::test]
    async fn invalid_url_is_a_hard_error() {
        let inputs = SourceInputs { urls: vec!["ftp://example.org/x".into()], ..Default::default() };
        let err = build_context(&inputs, &registry(), 12, 1024).await.unwrap_err();
        assert!(matches!(err, Error::Input(InputError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn topic_search_is_enriched() {
        let inputs = SourceInputs { topic: Some("levy".into()), ..Default::default() };
        let context = build_context(&inputs, &registry(), 12, 1024).await.unwrap();
        // Enriched full text plus the listing hit, deduped.
        assert!(context.has_web_sources());
        assert!(context.text.contains("Full fetched body"));
        assert!(context.sources.iter().any(|s| s.origin == SourceOrigin::Search));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_ingest() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(&[b'x'; 256]).unwrap();
        let inputs = SourceInputs { files: vec![file.path().to_path_buf()], ..Default::default() };
        let err = build_context(&inputs, &registry(), 12, 16).await.unwrap_err();
        assert!(matches!(err, Error::Input(InputError::FileTooLarge { .. })));
    }
}
