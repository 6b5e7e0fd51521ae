//! Backend fallback — ordered retry chain with per-backend timeouts.
//!
//! When a backend fails (timeout, rate limit, error, empty content), the
//! next backend in the configured chain is tried automatically.

use async_trait::async_trait;
use playforge_core::backend::{GenerationRequest, GenerativeBackend};
use playforge_core::error::BackendError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A backend that wraps an ordered list of backends and falls back on
/// failure.
pub struct FallbackBackend {
    name: String,
    chain: Vec<FallbackEntry>,
}

struct FallbackEntry {
    backend: Arc<dyn GenerativeBackend>,
    timeout: Duration,
}

impl FallbackBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), chain: Vec::new() }
    }

    /// Add a backend to the chain with a custom overall timeout.
    pub fn add(mut self, backend: Arc<dyn GenerativeBackend>, timeout: Duration) -> Self {
        self.chain.push(FallbackEntry { backend, timeout });
        self
    }

    /// Add a backend with the default timeout (300s, outer bound over the
    /// per-request timeout).
    pub fn add_default(self, backend: Arc<dyn GenerativeBackend>) -> Self {
        self.add(backend, Duration::from_secs(300))
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait]
impl GenerativeBackend for FallbackBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.chain.iter().any(|entry| entry.backend.is_configured())
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        let mut last_error = BackendError::NotConfigured("no backends in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            let backend_name = entry.backend.name().to_string();
            if !entry.backend.is_configured() {
                last_error = BackendError::NotConfigured(backend_name);
                continue;
            }

            info!(
                backend = %backend_name,
                attempt = i + 1,
                total = self.chain.len(),
                label = %request.label,
                "fallback: trying backend"
            );

            match tokio::time::timeout(entry.timeout, entry.backend.generate(request)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => {
                    warn!(backend = %backend_name, error = %e, "fallback: backend failed, trying next");
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        backend = %backend_name,
                        timeout_secs = entry.timeout.as_secs(),
                        "fallback: backend timed out, trying next"
                    );
                    last_error = BackendError::Timeout {
                        timeout_secs: entry.timeout.as_secs(),
                        context: format!("backend '{backend_name}', {}", request.label),
                    };
                }
            }
        }

        Err(last_error)
    }
}
