//! Built-in file ingest providers: plain text / HTML, EPUB, and PDF via
//! an extraction webhook.

use async_trait::async_trait;
use base64::Engine as _;
use playforge_core::error::{CapabilityError, InputError};
use playforge_core::{Source, SourceOrigin, text};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{Capability, CapabilityKind, CapabilityTask};

/// Largest EPUB member count we bother extracting.
const MAX_EPUB_CHAPTERS: usize = 40;

fn extension(path: &Path) -> String {
    path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase()
}

fn file_stem(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("document").to_string()
}

/// Reject unsupported formats and oversized files before any provider
/// runs. Kindle formats need DRM-aware tooling we do not ship.
pub fn preflight_file(path: &Path, max_bytes: usize) -> Result<(), InputError> {
    let ext = extension(path);
    if matches!(ext.as_str(), "mobi" | "azw" | "azw3") {
        return Err(InputError::UnsupportedFile(format!(
            "{ext} is not supported; convert to EPUB or PDF first"
        )));
    }
    let size = std::fs::metadata(path)
        .map_err(|_| InputError::MissingInput(path.display().to_string()))?
        .len() as usize;
    if size > max_bytes {
        return Err(InputError::FileTooLarge { size_bytes: size, limit_bytes: max_bytes });
    }
    Ok(())
}

/// Plain-text, Markdown, and HTML files.
pub struct TextFileIngest;

#[async_trait]
impl Capability for TextFileIngest {
    fn id(&self) -> &str {
        "text-file-ingest"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Ingest
    }
    fn label(&self) -> &str {
        "Plain text / Markdown / HTML files"
    }

    fn supports(&self, task: &CapabilityTask) -> bool {
        match task {
            CapabilityTask::Ingest { path } => {
                matches!(extension(path).as_str(), "txt" | "md" | "markdown" | "html" | "htm" | "")
            }
            _ => false,
        }
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Ingest { path } = task else {
            return Ok(vec![]);
        };
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            CapabilityError::AllProvidersFailed { kind: "ingest".into(), last_error: e.to_string() }
        })?;
        let content = if matches!(extension(path).as_str(), "html" | "htm") {
            text::strip_html(&raw)
        } else {
            raw
        };
        if content.trim().is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![Source::new(file_stem(path), None, "", &content, SourceOrigin::File)])
    }
}

/// EPUB extraction by shelling out to `unzip`.
pub struct EpubIngest;

#[async_trait]
impl Capability for EpubIngest {
    fn id(&self) -> &str {
        "epub-ingest"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Ingest
    }
    fn label(&self) -> &str {
        "EPUB books (via unzip)"
    }

    fn supports(&self, task: &CapabilityTask) -> bool {
        matches!(task, CapabilityTask::Ingest { path } if extension(path) == "epub")
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Ingest { path } = task else {
            return Ok(vec![]);
        };
        let failed = |e: String| CapabilityError::AllProvidersFailed {
            kind: "ingest".into(),
            last_error: e,
        };

        let listing = tokio::process::Command::new("unzip")
            .arg("-Z1")
            .arg(path)
            .output()
            .await
            .map_err(|e| failed(format!("unzip not available: {e}")))?;
        if !listing.status.success() {
            return Err(failed("unzip could not list the archive".into()));
        }

        let members: Vec<String> = String::from_utf8_lossy(&listing.stdout)
            .lines()
            .filter(|name| {
                let lower = name.to_lowercase();
                lower.ends_with(".xhtml") || lower.ends_with(".html") || lower.ends_with(".htm")
            })
            .map(str::to_string)
            .take(MAX_EPUB_CHAPTERS)
            .collect();
        debug!(count = members.len(), "epub chapter files found");

        let mut combined = String::new();
        for member in &members {
            let chapter = tokio::process::Command::new("unzip")
                .arg("-p")
                .arg(path)
                .arg(member)
                .output()
                .await
                .map_err(|e| failed(e.to_string()))?;
            if !chapter.status.success() {
                warn!(%member, "skipping unreadable epub member");
                continue;
            }
            let html = String::from_utf8_lossy(&chapter.stdout);
            combined.push_str(&text::strip_html(&html));
            combined.push('\n');
            if combined.chars().count() >= text::MAX_SOURCE_CONTENT {
                break;
            }
        }

        if combined.trim().is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![Source::new(file_stem(path), None, "", &combined, SourceOrigin::File)])
    }
}

/// PDF extraction through a configured webhook. The file travels as a
/// base64 payload; the webhook answers `{ "text": "..." }`.
pub struct PdfBridgeIngest {
    url: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl PdfBridgeIngest {
    pub fn new(url: Option<String>, timeout_secs: u64) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl Capability for PdfBridgeIngest {
    fn id(&self) -> &str {
        "pdf-bridge-ingest"
    }
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Ingest
    }
    fn label(&self) -> &str {
        "PDF extraction webhook"
    }
    fn enabled(&self) -> bool {
        self.url.is_some()
    }

    fn supports(&self, task: &CapabilityTask) -> bool {
        matches!(task, CapabilityTask::Ingest { path } if extension(path) == "pdf")
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let CapabilityTask::Ingest { path } = task else {
            return Ok(vec![]);
        };
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| CapabilityError::NotConfigured("pdf-bridge-ingest".into()))?;
        let failed = |e: String| CapabilityError::AllProvidersFailed {
            kind: "ingest".into(),
            last_error: e,
        };

        let bytes = tokio::fs::read(path).await.map_err(|e| failed(e.to_string()))?;
        let payload = serde_json::json!({
            "task": "extract_pdf_text",
            "filename": path.file_name().and_then(|n| n.to_str()).unwrap_or("document.pdf"),
            "content_base64": base64::engine::general_purpose::STANDARD.encode(&bytes),
        });

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("pdf webhook returned status {}", response.status())));
        }
        let json: serde_json::Value = response.json().await.map_err(|e| failed(e.to_string()))?;
        let extracted = json["text"].as_str().unwrap_or("").trim();
        if extracted.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![Source::new(file_stem(path), None, "", extracted, SourceOrigin::File)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn preflight_rejects_kindle_formats() {
        for name in ["book.mobi", "book.azw", "book.azw3"] {
            let err = preflight_file(Path::new(name), 1024).unwrap_err();
            assert!(matches!(err, InputError::UnsupportedFile(_)), "{name}");
        }
    }

    #[test]
    fn preflight_rejects_oversized_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        let err = preflight_file(file.path(), 16).unwrap_err();
        assert!(matches!(err, InputError::FileTooLarge { size_bytes: 64, limit_bytes: 16 }));
        assert!(preflight_file(file.path(), 1024).is_ok());
    }

    #[tokio::test]
    async fn text_ingest_reads_plain_files() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "The treasury ran dry in the third year.").unwrap();

        let task = CapabilityTask::Ingest { path: file.path().to_path_buf() };
        let ingest = TextFileIngest;
        assert!(ingest.supports(&task));
        let sources = ingest.run(&task).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert!(sources[0].content.contains("treasury"));
        assert_eq!(sources[0].origin, SourceOrigin::File);
    }

    #[tokio::test]
    async fn html_ingest_strips_markup() {
        let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        write!(file, "<html><body><p>Grain &amp; coin</p><script>x()</script></body></html>")
            .unwrap();

        let ingest = TextFileIngest;
        let task = CapabilityTask::Ingest { path: file.path().to_path_buf() };
        let sources = ingest.run(&task).await.unwrap();
        assert_eq!(sources[0].content, "Grain & coin");
    }

    #[test]
    fn format_routing_by_extension() {
        let epub_task = CapabilityTask::Ingest { path: "/tmp/book.epub".into() };
        let pdf_task = CapabilityTask::Ingest { path: "/tmp/paper.pdf".into() };

        assert!(EpubIngest.supports(&epub_task));
        assert!(!EpubIngest.supports(&pdf_task));
        assert!(PdfBridgeIngest::new(None, 45).supports(&pdf_task));
        assert!(!TextFileIngest.supports(&pdf_task));
    }

    #[test]
    fn pdf_bridge_disabled_without_url() {
        assert!(!PdfBridgeIngest::new(None, 45).enabled());
        assert!(PdfBridgeIngest::new(Some("https://bridge.local".into()), 45).enabled());
    }
}
