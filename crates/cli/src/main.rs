//! PlayForge CLI — the main entry point.
//!
//! Commands:
//! - `generate` — Compile source material into a playable experience
//! - `search`   — Query the configured search providers
//! - `ingest`   — Extract text from a local file
//! - `skills`   — List registered capabilities
//! - `status`   — Show configuration and store state

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "playforge",
    about = "PlayForge — compile source material into playable learning experiences",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a playable experience from source material
    Generate {
        /// Topic to research via the search providers
        #[arg(short, long)]
        topic: Option<String>,

        /// Inline source text; pass `-` to read from stdin
        #[arg(long)]
        text: Option<String>,

        /// Local files to ingest (txt, md, html, epub, pdf via bridge)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// URLs to fetch as sources
        #[arg(short, long = "url")]
        urls: Vec<String>,
    },

    /// Search the configured providers and list the merged results
    Search {
        query: String,

        /// Cap the merged result count
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Extract text from a local file and show what would be ingested
    Ingest { path: PathBuf },

    /// List registered capabilities (built-ins and configured webhooks)
    Skills,

    /// Show configuration and store state
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate { topic, text, files, urls } => {
            commands::generate::run(topic, text, files, urls).await?
        }
        Commands::Search { query, limit } => commands::search::run(&query, limit).await?,
        Commands::Ingest { path } => commands::ingest::run(&path).await?,
        Commands::Skills => commands::skills::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
