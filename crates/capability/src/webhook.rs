//! External capabilities reached over HTTP, declared in configuration.
//!
//! The webhook receives the task as JSON and answers
//! `{ "sources": [{ "title", "url", "snippet", "content" }] }`.

use async_trait::async_trait;
use playforge_config::ExternalCapabilityConfig;
use playforge_core::error::CapabilityError;
use playforge_core::{Source, SourceOrigin};
use std::time::Duration;

use crate::{Capability, CapabilityKind, CapabilityOrigin, CapabilityTask};

pub struct WebhookCapability {
    id: String,
    kind: CapabilityKind,
    label: String,
    url: String,
    priority: u32,
    enabled: bool,
    timeout: Duration,
    client: reqwest::Client,
}

impl WebhookCapability {
    /// Returns `None` when the declared kind is unknown.
    pub fn from_config(config: &ExternalCapabilityConfig) -> Option<Self> {
        let kind = CapabilityKind::parse(&config.kind)?;
        Some(Self {
            id: config.id.clone(),
            kind,
            label: if config.label.is_empty() { config.id.clone() } else { config.label.clone() },
            url: config.url.clone(),
            priority: config.priority,
            enabled: config.enabled,
            timeout: Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        })
    }

    fn payload(&self, task: &CapabilityTask) -> serde_json::Value {
        match task {
            CapabilityTask::Search { query, limit } => {
                serde_json::json!({ "kind": "search", "query": query, "limit": limit })
            }
            CapabilityTask::Ingest { path } => {
                serde_json::json!({ "kind": "ingest", "path": path.display().to_string() })
            }
            CapabilityTask::Context { reference } => {
                serde_json::json!({ "kind": "context", "reference": reference })
            }
        }
    }
}

#[async_trait]
impl Capability for WebhookCapability {
    fn id(&self) -> &str {
        &self.id
    }
    fn kind(&self) -> CapabilityKind {
        self.kind
    }
    fn label(&self) -> &str {
        &self.label
    }
    fn priority(&self) -> u32 {
        self.priority
    }
    fn origin(&self) -> CapabilityOrigin {
        CapabilityOrigin::External
    }
    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn run(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let failed = |e: String| CapabilityError::AllProvidersFailed {
            kind: self.kind.as_str().to_string(),
            last_error: e,
        };

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&self.payload(task))
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("webhook returned status {}", response.status())));
        }
        let json: serde_json::Value =
            response.json().await.map_err(|e| failed(e.to_string()))?;

        let origin = match self.kind {
            CapabilityKind::Search => SourceOrigin::Search,
            CapabilityKind::Ingest => SourceOrigin::File,
            CapabilityKind::Context => SourceOrigin::Enrichment,
        };
        Ok(parse_sources(&json, origin))
    }
}

fn parse_sources(json: &serde_json::Value, origin: SourceOrigin) -> Vec<Source> {
    json["sources"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let title = item["title"].as_str()?.trim();
            if title.is_empty() {
                return None;
            }
            Some(Source::new(
                title,
                item["url"].as_str().map(str::to_string),
                item["snippet"].as_str().unwrap_or(""),
                item["content"].as_str().unwrap_or(""),
                origin,
            ))
        })
        .collect()
}
