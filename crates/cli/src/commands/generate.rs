//! `playforge generate` — Run the full pipeline for one set of inputs.

use anyhow::Context as _;
use playforge_config::AppConfig;
use playforge_core::{CancelSignal, ProgressEvent, ProgressSink};
use playforge_pipeline::{Pipeline, SourceInputs};
use std::io::Read as _;
use std::path::PathBuf;

/// Prints stage updates as they arrive.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: ProgressEvent) {
        println!("  [{:>3}%] {}", event.percent, event.message);
    }
}

pub async fn run(
    topic: Option<String>,
    text: Option<String>,
    files: Vec<PathBuf>,
    urls: Vec<String>,
) -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load config")?;
    let pipeline = Pipeline::from_config(&config)?;

    let text = match text.as_deref() {
        Some("-") => Some(read_stdin()?),
        other => other.map(str::to_string),
    };
    let inputs = SourceInputs { topic, text, files, urls };

    let cancel = CancelSignal::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  cancelling after the current stage...");
            watcher.cancel();
        }
    });

    println!("🛠️  PlayForge Generate");
    println!("=====================");
    let outcome = pipeline.generate(&inputs, &ConsoleProgress, &cancel).await?;

    println!("\n✅ \"{}\" is ready", outcome.title);
    println!("  Experience id: {}", outcome.book_id);
    println!("  Artifacts:     {}", outcome.artifact_dir.display());
    for module in &outcome.modules {
        println!("  Module {:>2}:     {} ({})", module.order, module.title, module.generated_by);
    }
    println!(
        "  Knowledge:     {} skills, {} glossary entries, {} quiz questions",
        outcome.pack.skills.len(),
        outcome.pack.entries.len(),
        outcome.pack.questions.len()
    );
    println!(
        "  Think tank:    {} new, {} updated, {} total entries",
        outcome.merge.inserted, outcome.merge.updated, outcome.merge.total_entries
    );

    Ok(())
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
    Ok(buffer)
}
