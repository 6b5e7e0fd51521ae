//! Capability registry: registration, ordering, and resolution.
//!
//! Ordering is ascending priority, then builtin-before-external, then by
//! id. Search tasks fan out across every supporting provider and merge;
//! ingest and context tasks walk the chain and take the first success.

use futures::future::join_all;
use playforge_core::error::CapabilityError;
use playforge_core::{Source, dedupe_sources};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{Capability, CapabilityDescriptor, CapabilityKind, CapabilityTask};

#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. A capability with the same id replaces the
    /// existing one, letting config override a built-in.
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        let id = capability.id().to_string();
        if self.capabilities.insert(id.clone(), capability).is_some() {
            debug!(%id, "capability replaced");
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(id).cloned()
    }

    /// Enabled capabilities of one kind, in resolution order: ascending
    /// priority, builtin before external, then id.
    pub fn of_kind(&self, kind: CapabilityKind) -> Vec<Arc<dyn Capability>> {
        let mut matching: Vec<_> = self
            .capabilities
            .values()
            .filter(|c| c.kind() == kind && c.enabled())
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let rank = |c: &Arc<dyn Capability>| match c.origin() {
                crate::CapabilityOrigin::Builtin => 0,
                crate::CapabilityOrigin::External => 1,
            };
            a.priority()
                .cmp(&b.priority())
                .then_with(|| rank(a).cmp(&rank(b)))
                .then_with(|| a.id().cmp(b.id()))
        });
        matching
    }

    /// Every registered capability, for listing. Same ordering as
    /// `of_kind`, disabled ones included.
    pub fn descriptors(&self) -> Vec<CapabilityDescriptor> {
        let mut all: Vec<CapabilityDescriptor> = self
            .capabilities
            .values()
            .map(|c| CapabilityDescriptor {
                id: c.id().to_string(),
                kind: c.kind(),
                label: c.label().to_string(),
                priority: c.priority(),
                origin: c.origin(),
                enabled: c.enabled(),
            })
            .collect();
        all.sort_by(|a, b| {
            let rank = |o: crate::CapabilityOrigin| match o {
                crate::CapabilityOrigin::Builtin => 0,
                crate::CapabilityOrigin::External => 1,
            };
            a.priority
                .cmp(&b.priority)
                .then_with(|| rank(a.origin).cmp(&rank(b.origin)))
                .then_with(|| a.id.cmp(&b.id))
        });
        all
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Fan a search out across every supporting provider, merge and
    /// dedupe, cap at `limit`. Per-provider failures are non-fatal; the
    /// merged listing can legitimately be empty.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<Source> {
        let task = CapabilityTask::Search { query: query.to_string(), limit };
        let providers: Vec<_> = self
            .of_kind(CapabilityKind::Search)
            .into_iter()
            .filter(|c| c.supports(&task))
            .collect();

        let results = join_all(providers.iter().map(|provider| {
            let task = task.clone();
            async move { (provider.id().to_string(), provider.run(&task).await) }
        }))
        .await;

        let mut merged = Vec::new();
        for (id, outcome) in results {
            match outcome {
                Ok(sources) => merged.extend(sources),
                Err(e) => warn!(capability = %id, error = %e, "search provider failed"),
            }
        }
        let mut deduped = dedupe_sources(merged);
        deduped.truncate(limit);
        deduped
    }

    /// Run an ingest or context task through the first provider that
    /// succeeds.
    pub async fn resolve_first(&self, task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
        let kind = task.kind();
        let mut attempted = false;
        let mut last_error = String::new();

        for provider in self.of_kind(kind) {
            if !provider.supports(task) {
                continue;
            }
            attempted = true;
            match provider.run(task).await {
                Ok(sources) if !sources.is_empty() => return Ok(sources),
                Ok(_) => {
                    debug!(capability = %provider.id(), "provider returned nothing, trying next");
                    last_error = format!("'{}' returned no sources", provider.id());
                }
                Err(e) => {
                    warn!(capability = %provider.id(), error = %e, "provider failed, trying next");
                    last_error = e.to_string();
                }
            }
        }

        if !attempted {
            return Err(CapabilityError::NoneApplicable { kind: kind.as_str().to_string() });
        }
        Err(CapabilityError::AllProvidersFailed {
            kind: kind.as_str().to_string(),
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CapabilityOrigin;
    use async_trait::async_trait;
    use playforge_core::SourceOrigin;

    struct StubCapability {
        id: &'static str,
        kind: CapabilityKind,
        priority: u32,
        origin: CapabilityOrigin,
        outcome: Result<Vec<Source>, CapabilityError>,
    }

    impl StubCapability {
        fn search_ok(id: &'static str, titles: &[&str]) -> Arc<dyn Capability> {
            Arc::new(Self {
                id,
                kind: CapabilityKind::Search,
                priority: 100,
                origin: CapabilityOrigin::Builtin,
                outcome: Ok(titles
                    .iter()
                    .map(|t| {
                        Source::new(
                            *t,
                            Some(format!("https://example.org/{t}")),
                            "s",
                            "",
                            SourceOrigin::Search,
                        )
                    })
                    .collect()),
            })
        }

        fn failing(id: &'static str, kind: CapabilityKind) -> Arc<dyn Capability> {
            Arc::new(Self {
                id,
                kind,
                priority: 100,
                origin: CapabilityOrigin::Builtin,
                outcome: Err(CapabilityError::NotConfigured(id.to_string())),
            })
        }
    }

    #[async_trait]
    impl Capability for StubCapability {
        fn id(&self) -> &str {
            self.id
        }
        fn kind(&self) -> CapabilityKind {
            self.kind
        }
        fn label(&self) -> &str {
            self.id
        }
        fn priority(&self) -> u32 {
            self.priority
        }
        fn origin(&self) -> CapabilityOrigin {
            self.origin
        }
        async fn run(&self, _task: &CapabilityTask) -> Result<Vec<Source>, CapabilityError> {
            match &self.outcome {
                Ok(sources) => Ok(sources.clone()),
                Err(e) => Err(e.clone()),
            }
        }
    }

    #[test]
    fn ordering_priority_then_builtin_then_id() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubCapability {
            id: "zeta",
            kind: CapabilityKind::Search,
            priority: 100,
            origin: CapabilityOrigin::External,
            outcome: Ok(vec![]),
        }));
        registry.register(Arc::new(StubCapability {
            id: "urgent",
            kind: CapabilityKind::Search,
            priority: 10,
            origin: CapabilityOrigin::External,
            outcome: Ok(vec![]),
        }));
        registry.register(StubCapability::search_ok("beta", &[]));
        registry.register(StubCapability::search_ok("alpha", &[]));

        let ids: Vec<_> = registry
            .of_kind(CapabilityKind::Search)
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["urgent", "alpha", "beta", "zeta"]);
    }

    #[test]
    fn register_same_id_replaces() {
        let mut registry = CapabilityRegistry::new();
        registry.register(StubCapability::search_ok("wiki", &["old"]));
        registry.register(StubCapability::search_ok("wiki", &["new"]));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn search_merges_and_tolerates_failures() {
        let mut registry = CapabilityRegistry::new();
        registry.register(StubCapability::search_ok("a", &["One", "Two"]));
        registry.register(StubCapability::failing("b", CapabilityKind::Search));
        registry.register(StubCapability::search_ok("c", &["Two", "Three"]));

        let results = registry.search("anything", 12).await;
        let titles: Vec<_> = results.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let mut registry = CapabilityRegistry::new();
        registry.register(StubCapability::search_ok("a", &["1", "2", "3", "4"]));
        let results = registry.search("q", 2).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn first_success_skips_failures() {
        let mut registry = CapabilityRegistry::new();
        registry.register(StubCapability::failing("a-fails", CapabilityKind::Context));
        registry.register(Arc::new(StubCapability {
            id: "b-works",
            kind: CapabilityKind::Context,
            origin: CapabilityOrigin::Builtin,
            priority: 100,
            outcome: Ok(vec![Source::new("hit", None, "", "body", SourceOrigin::Enrichment)]),
        }));

        let task = CapabilityTask::Context { reference: "x".into() };
        let sources = registry.resolve_first(&task).await.unwrap();
        assert_eq!(sources[0].title, "hit");
    }

    #[tokio::test]
    async fn no_applicable_provider_is_distinct_from_all_failed() {
        let mut registry = CapabilityRegistry::new();
        registry.register(StubCapability::failing("ctx", CapabilityKind::Context));

        let ingest = CapabilityTask::Ingest { path: "/tmp/x.txt".into() };
        assert!(matches!(
            registry.resolve_first(&ingest).await.unwrap_err(),
            CapabilityError::NoneApplicable { .. }
        ));

        let context = CapabilityTask::Context { reference: "x".into() };
        assert!(matches!(
            registry.resolve_first(&context).await.unwrap_err(),
            CapabilityError::AllProvidersFailed { .. }
        ));
    }
}
