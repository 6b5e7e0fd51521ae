//! `playforge ingest` — Preview what a local file would contribute.

use anyhow::Context as _;
use playforge_capability::ingest::preflight_file;
use playforge_capability::{CapabilityTask, bootstrap_registry};
use playforge_config::AppConfig;
use playforge_core::text::{clamp_chars, collapse_whitespace};
use std::path::Path;

pub async fn run(path: &Path) -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load config")?;
    let registry = bootstrap_registry(&config);

    preflight_file(path, config.network.max_file_bytes)?;
    let task = CapabilityTask::Ingest { path: path.to_path_buf() };
    let sources = registry
        .resolve_first(&task)
        .await
        .with_context(|| format!("could not ingest {}", path.display()))?;

    println!("📄 {}", path.display());
    println!("==={}", "=".repeat(path.display().to_string().len()));
    for source in &sources {
        println!("  Title:   {}", source.title);
        println!("  Length:  {} chars", source.content.chars().count());
        let preview = clamp_chars(&collapse_whitespace(&source.content), 240);
        println!("  Preview: {preview}");
        println!();
    }
    println!("  {} source(s) extracted", sources.len());
    Ok(())
}
