//! HTTP generative backend.
//!
//! Speaks both common wire shapes against one base URL: the responses API
//! (`/responses`, `input` array, `max_output_tokens`) and chat completions
//! (`/chat/completions`, `messages`, `max_tokens`). When the base URL does
//! not pin a shape, the responses shape is tried first and chat completions
//! is the fallback for empty content. Bodies that come back as SSE despite
//! a non-streaming request are reassembled by [`crate::sse`].

use async_trait::async_trait;
use playforge_config::GenerativeConfig;
use playforge_core::backend::{GenerationRequest, GenerativeBackend};
use playforge_core::error::BackendError;
use std::time::Duration;
use tracing::{debug, warn};

use crate::sse::{completed_response_text, looks_like_sse, parse_sse_text};

/// Which request/response schema to use against the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireShape {
    Responses,
    ChatCompletions,
}

pub struct HttpGenerativeBackend {
    name: String,
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl HttpGenerativeBackend {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_default();
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            client,
        }
    }

    pub fn from_config(name: impl Into<String>, config: &GenerativeConfig) -> Self {
        Self::new(name, config.endpoint.clone(), config.api_key.clone(), config.model.clone())
    }

    /// Shapes to attempt, derived from the base URL.
    fn shapes(&self) -> Vec<WireShape> {
        if self.base_url.contains("/chat/completions") {
            vec![WireShape::ChatCompletions]
        } else if self.base_url.ends_with("/responses") {
            vec![WireShape::Responses]
        } else {
            vec![WireShape::Responses, WireShape::ChatCompletions]
        }
    }

    fn url_for(&self, shape: WireShape) -> String {
        if self.base_url.contains("/chat/completions") || self.base_url.ends_with("/responses") {
            return self.base_url.clone();
        }
        match shape {
            WireShape::Responses => format!("{}/responses", self.base_url),
            WireShape::ChatCompletions => format!("{}/chat/completions", self.base_url),
        }
    }

    fn body_for(&self, shape: WireShape, request: &GenerationRequest) -> serde_json::Value {
        match shape {
            WireShape::Responses => serde_json::json!({
                "model": self.model,
                "input": [
                    { "role": "system", "content": request.system },
                    { "role": "user", "content": request.prompt },
                ],
                "max_output_tokens": request.max_tokens,
                "temperature": request.temperature,
                "stream": false,
            }),
            WireShape::ChatCompletions => serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": request.system },
                    { "role": "user", "content": request.prompt },
                ],
                "max_tokens": request.max_tokens,
                "temperature": request.temperature,
                "stream": false,
            }),
        }
    }

    async fn call_once(
        &self,
        shape: WireShape,
        request: &GenerationRequest,
    ) -> Result<String, BackendError> {
        let url = self.url_for(shape);
        debug!(backend = %self.name, %url, label = %request.label, "sending generation request");

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(request.timeout_secs))
            .json(&self.body_for(shape, request));
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout {
                    timeout_secs: request.timeout_secs,
                    context: request.label.clone(),
                }
            } else {
                BackendError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            return Err(BackendError::RateLimited { retry_after_secs: 5 });
        }
        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(backend = %self.name, status, body = %error_body, "backend returned error");
            return Err(BackendError::Api { status_code: status, message: error_body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::StreamInterrupted(e.to_string()))?;
        extract_text(shape, &body)
    }
}

/// Pull the generated text out of a response body, JSON first, SSE second.
fn extract_text(shape: WireShape, body: &str) -> Result<String, BackendError> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body.trim()) {
        let text = match shape {
            WireShape::ChatCompletions => json["choices"][0]["message"]["content"]
                .as_str()
                .map(|t| t.trim().to_string()),
            WireShape::Responses => completed_response_text(&json),
        };
        return Ok(text.unwrap_or_default());
    }
    if looks_like_sse(body) {
        return parse_sse_text(body);
    }
    Ok(String::new())
}

#[async_trait]
impl GenerativeBackend for HttpGenerativeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        let mut last_error =
            BackendError::NotConfigured(format!("backend '{}' has no usable shape", self.name));

        for shape in self.shapes() {
            match self.call_once(shape, request).await {
                Ok(text) if !text.is_empty() => return Ok(text),
                Ok(_) => {
                    warn!(backend = %self.name, ?shape, "empty content, trying next wire shape");
                    last_error = BackendError::EmptyContent(request.label.clone());
                }
                // Auth and rate-limit failures apply to every shape equally.
                Err(e @ (BackendError::AuthenticationFailed(_) | BackendError::RateLimited { .. })) => {
                    return Err(e);
                }
                Err(e) => {
                    warn!(backend = %self.name, ?shape, error = %e, "wire shape failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}
