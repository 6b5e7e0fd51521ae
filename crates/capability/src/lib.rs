//! Typed capability registry for PlayForge.
//!
//! A capability is one provider of one of three kinds of work:
//! - `search`: query → listing of candidate sources
//! - `ingest`: local file → extracted sources
//! - `context`: reference (URL or topic) → fetched sources
//!
//! Built-ins are registered at bootstrap; external webhook capabilities
//! come from configuration and can replace a built-in by reusing its id.

pub mod context;
pub mod ingest;
pub mod registry;
pub mod search;
pub mod webhook;

pub use registry::CapabilityRegistry;

use async_trait::async_trait;
use playforge_core::Source;
use playforge_core::error::CapabilityError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The three kinds of capability work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Search,
    Ingest,
    Context,
}

impl CapabilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Ingest => "ingest",
            Self::Context => "context",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "search" => Some(Self::Search),
            "ingest" => Some(Self::Ingest),
            "context" => Some(Self::Context),
            _ => None,
        }
    }
}

/// Whether a capability ships with the binary or came from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityOrigin {
    Builtin,
    External,
}

/// One unit of work handed to a capability.
#[derive(Debug, Clone)]
pub enum CapabilityTask {
    Search { query: String, limit: usize },
    Ingest { path: PathBuf },
    Context { reference: String },
}

impl CapabilityTask {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::Search { .. } => CapabilityKind::Search,
            Self::Ingest { .. } => CapabilityKind::Ingest,
            Self::Context { .. } => CapabilityKind::Context,
        }
    }
}

/// Listing entry for `skills`-style introspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub id: String,
    pub kind: CapabilityKind,
    pub label: String,
    pub priority: u32,
    pub origin: CapabilityOrigin,
    pub enabled: bool,
}

/// Build the standard registry: every built-in provider, then the
/// external webhooks from configuration (which may replace built-ins by
/// id).
pub fn bootstrap_registry(config: &playforge_config::AppConfig) -> CapabilityRegistry {
    use std::sync::Arc;

    let mut registry = CapabilityRegistry::new();
    let search_timeout = config.network.search_timeout_secs;
    let fetch_timeout = config.network.fetch_timeout_secs;

    registry.register(Arc::new(search::WikipediaSearch::new(search_timeout)));
    registry.register(Arc::new(search::CrossrefSearch::new(search_timeout)));
    registry.register(Arc::new(search::OpenAlexSearch::new(search_timeout)));

    registry.register(Arc::new(ingest::TextFileIngest));
    registry.register(Arc::new(ingest::EpubIngest));
    registry.register(Arc::new(ingest::PdfBridgeIngest::new(
        config.pdf_bridge.url.clone().filter(|_| config.pdf_bridge.enabled),
        config.pdf_bridge.timeout_secs,
    )));

    registry.register(Arc::new(context::ArxivContext::new(fetch_timeout)));
    registry.register(Arc::new(context::UrlFetchContext::new(fetch_timeout)));
    registry.register(Arc::new(context::TopicLookupContext::new(fetch_timeout)));

    for entry in &config.capabilities {
        match webhook::WebhookCapability::from_config(entry) {
            Some(capability) => registry.register(Arc::new(capability)),
            None => tracing::warn!(id = %entry.id, kind = %entry.kind, "skipping capability with unknown kind"),
        }
    }
    registry
}

/// One provider of search, ingest, or context work.
#[async_trait]
pub trait Capability: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> CapabilityKind;
    fn label(&self) -> &str;

    /// Resolution order within a kind; lower runs first.
    fn priority(&self) -> u32 {
        100
    }

    fn origin(&self) -> CapabilityOrigin {
        CapabilityOrigin::Builtin
    }

    fn enabled(&self) -> bool {
        true
    }

    /// Whether this capability can handle the given task at all. Called
    /// before `run`; a `false` here is not a failure.
    fn supports(&self, task: &CapabilityTask) -> bool {
        task.kind() == self.kind()
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError>;
}
