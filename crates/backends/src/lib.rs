//! Generative backend clients for PlayForge.
//!
//! [`HttpGenerativeBackend`] talks to one endpoint; [`FallbackBackend`]
//! chains several with per-entry timeouts. [`backend_from_config`] wires
//! the configured primary and fallbacks into one chain.

pub mod fallback;
pub mod http;
pub mod sse;

pub use fallback::FallbackBackend;
pub use http::HttpGenerativeBackend;

use playforge_config::AppConfig;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured backend chain: primary first, then fallbacks in
/// declaration order. Unconfigured entries are skipped with a warning.
pub fn backend_from_config(config: &AppConfig) -> FallbackBackend {
    let mut chain = FallbackBackend::new("configured");

    let entries = std::iter::once((&config.generative, "primary".to_string())).chain(
        config
            .fallbacks
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry, format!("fallback-{}", i + 1))),
    );

    for (entry, name) in entries {
        if !entry.is_configured() {
            tracing::warn!(backend = %name, "skipping backend without an API key");
            continue;
        }
        chain = chain.add(
            Arc::new(HttpGenerativeBackend::from_config(name, entry)),
            Duration::from_secs(entry.timeout_secs.saturating_mul(2).max(60)),
        );
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use playforge_config::GenerativeConfig;

    #[test]
    fn unconfigured_entries_are_skipped() {
        let config = AppConfig::default();
        let chain = backend_from_config(&config);
        assert!(chain.is_empty());
    }

    #[test]
    fn primary_and_fallbacks_are_chained_in_order() {
        let config = AppConfig {
            generative: GenerativeConfig { api_key: Some("k1".into()), ..Default::default() },
            fallbacks: vec![
                GenerativeConfig { api_key: None, ..Default::default() },
                GenerativeConfig { api_key: Some("k2".into()), ..Default::default() },
            ],
            ..AppConfig::default()
        };
        let chain = backend_from_config(&config);
        assert_eq!(chain.len(), 2);
    }
}
