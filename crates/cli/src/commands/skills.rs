//! `playforge skills` — List registered capabilities.

use anyhow::Context as _;
use playforge_capability::{CapabilityOrigin, bootstrap_registry};
use playforge_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load config")?;
    let registry = bootstrap_registry(&config);

    println!("🧩 Registered capabilities");
    println!("==========================");
    for descriptor in registry.descriptors() {
        let origin = match descriptor.origin {
            CapabilityOrigin::Builtin => "builtin",
            CapabilityOrigin::External => "webhook",
        };
        let state = if descriptor.enabled { "" } else { "  (disabled)" };
        println!(
            "  {:<24} {:<8} {:<8} {}{state}",
            descriptor.id,
            descriptor.kind.as_str(),
            origin,
            descriptor.label
        );
    }
    println!("\n  {} capabilit(ies) registered", registry.len());
    Ok(())
}
