//! Error types for the PlayForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Retry policy lives with
//! the callers; every error here is a terminal outcome for one attempt.

use thiserror::Error;

/// The top-level error type for all PlayForge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Input errors (fatal, surfaced immediately) ---
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    // --- Generative / search / bridge backend errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Quality gate errors ---
    #[error("Quality gate failed: {0}")]
    Quality(#[from] QualityError),

    // --- Module rendering errors ---
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    // --- Capability resolution errors ---
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    // --- Knowledge store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Cooperative cancellation ---
    #[error("Run cancelled at stage '{stage}'")]
    Cancelled { stage: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// The caller gave us nothing we can build a context from.
#[derive(Debug, Clone, Error)]
pub enum InputError {
    #[error("source context is empty; provide text, sources, or a query")]
    EmptyContext,

    #[error("input is required for mode '{0}'")]
    MissingInput(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("file too large ({size_bytes} bytes, limit {limit_bytes})")]
    FileTooLarge { size_bytes: usize, limit_bytes: usize },
}

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out after {timeout_secs}s: {context}")]
    Timeout { timeout_secs: u64, context: String },

    #[error("Backend returned empty content: {0}")]
    EmptyContent(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl BackendError {
    /// Whether one more attempt at the same call is worth making.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::EmptyContent(_)
                | Self::Network(_)
                | Self::StreamInterrupted(_)
                | Self::RateLimited { .. }
        )
    }
}

/// A generative result was well-formed but rejected by a quality gate.
///
/// Carries the last score that caused rejection so failures are debuggable
/// without replaying the generative call.
#[derive(Debug, Clone, Error)]
pub enum QualityError {
    #[error(
        "blueprint grounding too low after retry: {hits} term hits, overlap ratio {overlap_ratio:.3}"
    )]
    BlueprintRejected { overlap_ratio: f64, hits: usize },

    #[error("blueprint density too low: {0}")]
    LowDensity(String),

    #[error("backend returned a malformed document: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("{tier} candidate rejected: {reason}")]
    CandidateRejected { tier: String, reason: String },

    #[error("generative HTML is required but no valid candidate was produced: {0}")]
    GenerativeRequired(String),

    #[error("bridge renderer failed: {0}")]
    BridgeFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("all {kind} providers failed; last error: {last_error}")]
    AllProvidersFailed { kind: String, last_error: String },

    #[error("no {kind} provider supports this input")]
    NoneApplicable { kind: String },

    #[error("capability '{0}' is not configured")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(String),

    #[error("store file is corrupt: {0}")]
    Corrupt(String),

    #[error("failed to serialize store: {0}")]
    Serialization(String),
}
