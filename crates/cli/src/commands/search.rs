//! `playforge search` — Query the configured search providers.

use anyhow::Context as _;
use playforge_capability::bootstrap_registry;
use playforge_config::AppConfig;

pub async fn run(query: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load config")?;
    let registry = bootstrap_registry(&config);
    let limit = limit.unwrap_or(config.network.search_result_limit);

    println!("🔍 Searching for \"{query}\"...\n");
    let results = registry.search(query, limit).await;
    if results.is_empty() {
        println!("  No results. Providers may be unreachable; try --verbose.");
        return Ok(());
    }

    for (i, source) in results.iter().enumerate() {
        println!("{:>3}. {}", i + 1, source.title);
        if let Some(url) = &source.url {
            println!("     {url}");
        }
        if !source.snippet.is_empty() {
            println!("     {}", source.snippet);
        }
        println!();
    }
    println!("  {} result(s)", results.len());
    Ok(())
}
