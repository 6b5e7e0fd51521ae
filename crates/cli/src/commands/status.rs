//! `playforge status` — Show configuration and store state.

use anyhow::Context as _;
use playforge_config::AppConfig;
use playforge_store::{GenerationCatalog, ThinkTankStore};

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load config")?;

    println!("🛠️  PlayForge Status");
    println!("===================");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Model:         {} @ {}", config.generative.model, config.generative.endpoint);
    println!(
        "  Backend:       {}",
        if config.generative.is_configured() { "configured" } else { "no API key" }
    );
    println!("  Fallbacks:     {}", config.fallbacks.len());
    println!(
        "  Bridge:        {}",
        if config.bridge.is_configured() { "enabled" } else { "disabled" }
    );
    println!(
        "  PDF bridge:    {}",
        if config.pdf_bridge.is_configured() { "enabled" } else { "disabled" }
    );
    println!("  Strict HTML:   {}", config.require_generative_html);
    println!("  Artifacts:     {}", config.storage.artifact_root.display());

    let store = ThinkTankStore::open(&config.storage.think_tank_path)?;
    let entries = store.entries().await;
    let related: usize = entries.iter().map(|e| e.relations.len()).sum();
    let books = store.book_summaries().await;
    println!(
        "\n  Think tank:    {} entries, {} relations, {} document(s)",
        entries.len(),
        related,
        books.len()
    );

    let catalog = GenerationCatalog::open(&config.storage.catalog_path)?;
    let records = catalog.records().await;
    println!("  Experiences:   {}", records.len());
    for record in records.iter().take(5) {
        println!(
            "    {:<28} {} module(s), {}",
            record.book_id,
            record.module_count,
            record.generated_at.format("%Y-%m-%d %H:%M")
        );
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file at {} — defaults in use", config_path.display());
    }

    Ok(())
}
