//! The generative backend seam.
//!
//! Everything that needs model output (blueprints, module HTML, knowledge
//! packs) goes through [`GenerativeBackend`], so the pipeline can run
//! against any provider chain, or a mock in tests.

use async_trait::async_trait;

use crate::error::BackendError;

/// One text-generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System framing for the call.
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Short label naming the call site, used in logs and timeouts.
    pub label: String,
}

impl GenerationRequest {
    pub fn new(label: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens: 2_400,
            temperature: 0.4,
            timeout_secs: 120,
            label: label.into(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// A text-generation provider.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Stable name for logs and artifacts.
    fn name(&self) -> &str;

    /// Whether this backend has what it needs (keys, endpoint) to run.
    fn is_configured(&self) -> bool {
        true
    }

    /// Produce the text for one request. Implementations must return
    /// [`BackendError::EmptyContent`] rather than an empty string.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedBackend(&'static str);

    #[async_trait]
    impl GenerativeBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, BackendError> {
            if self.0.is_empty() {
                return Err(BackendError::EmptyContent("canned".into()));
            }
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn request_builder_defaults() {
        let request = GenerationRequest::new("blueprint", "sys", "prompt").temperature(0.85);
        assert_eq!(request.max_tokens, 2_400);
        assert_eq!(request.timeout_secs, 120);
        assert!((request.temperature - 0.85).abs() < f32::EPSILON);

        let backend = CannedBackend("hello");
        assert_eq!(backend.generate(&request).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let backend = CannedBackend("");
        let request = GenerationRequest::new("x", "s", "p");
        assert!(matches!(
            backend.generate(&request).await,
            Err(BackendError::EmptyContent(_))
        ));
    }
}
