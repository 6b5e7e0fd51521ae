//! Configuration loading, validation, and management for PlayForge.
//!
//! Loads configuration from `~/.playforge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.playforge/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Primary generative backend.
    #[serde(default)]
    pub generative: GenerativeConfig,

    /// Ordered fallback backends, tried after the primary.
    #[serde(default)]
    pub fallbacks: Vec<GenerativeConfig>,

    /// Design-bridge webhook (first module render tier).
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// PDF extraction webhook.
    #[serde(default)]
    pub pdf_bridge: BridgeConfig,

    /// Fail a run rather than fall back to the deterministic module
    /// template.
    #[serde(default)]
    pub require_generative_html: bool,

    /// Search / fetch timeouts and limits.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Where generated experiences and state land.
    #[serde(default)]
    pub storage: StorageConfig,

    /// External capability webhooks registered alongside the built-ins.
    #[serde(default)]
    pub capabilities: Vec<ExternalCapabilityConfig>,
}

/// One generative endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerativeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL; the wire shape (`/responses` vs `/chat/completions`) is
    /// negotiated at request time.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.4
}
fn default_max_tokens() -> u32 {
    4_096
}
fn default_llm_timeout() -> u64 {
    120
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl GenerativeConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// A webhook endpoint with its own timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_bridge_timeout")]
    pub timeout_secs: u64,
}

fn default_bridge_timeout() -> u64 {
    180
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { enabled: false, url: None, timeout_secs: default_bridge_timeout() }
    }
}

impl BridgeConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Upper bound on merged search results per query.
    #[serde(default = "default_search_limit")]
    pub search_result_limit: usize,

    /// Largest file accepted for ingestion, in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

fn default_search_timeout() -> u64 {
    10
}
fn default_fetch_timeout() -> u64 {
    18
}
fn default_search_limit() -> usize {
    12
}
fn default_max_file_bytes() -> usize {
    12 * 1024 * 1024
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: default_search_timeout(),
            fetch_timeout_secs: default_fetch_timeout(),
            search_result_limit: default_search_limit(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root for per-experience artifact directories.
    #[serde(default = "default_artifact_root")]
    pub artifact_root: PathBuf,

    /// Think-tank store file.
    #[serde(default = "default_store_path")]
    pub think_tank_path: PathBuf,

    /// Generation-record catalog file.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

fn default_artifact_root() -> PathBuf {
    AppConfig::config_dir().join("book_experiences")
}
fn default_store_path() -> PathBuf {
    AppConfig::config_dir().join("think_tank.json")
}
fn default_catalog_path() -> PathBuf {
    AppConfig::config_dir().join("catalog.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_root: default_artifact_root(),
            think_tank_path: default_store_path(),
            catalog_path: default_catalog_path(),
        }
    }
}

/// An external capability provider reached over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalCapabilityConfig {
    /// Unique id; collides with a built-in id replace the built-in.
    pub id: String,

    /// "search", "ingest", or "context".
    pub kind: String,

    #[serde(default)]
    pub label: String,

    pub url: String,

    /// Resolution order within a kind; lower runs first. Built-ins use 100.
    #[serde(default = "default_capability_priority")]
    pub priority: u32,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_capability_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_capability_priority() -> u32 {
    100
}
fn default_capability_timeout() -> u64 {
    30
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("generative", &self.generative)
            .field("fallbacks", &self.fallbacks)
            .field("bridge", &self.bridge)
            .field("pdf_bridge", &self.pdf_bridge)
            .field("require_generative_html", &self.require_generative_html)
            .field("network", &self.network)
            .field("storage", &self.storage)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl std::fmt::Debug for GenerativeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.playforge/config.toml).
    ///
    /// Environment overrides, highest priority:
    /// - `PLAYFORGE_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `PLAYFORGE_ENDPOINT`, `PLAYFORGE_MODEL`
    /// - `PLAYFORGE_BRIDGE_URL`
    /// - `PLAYFORGE_REQUIRE_GENERATIVE_HTML`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.generative.api_key.is_none() {
            config.generative.api_key = std::env::var("PLAYFORGE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(endpoint) = std::env::var("PLAYFORGE_ENDPOINT") {
            config.generative.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("PLAYFORGE_MODEL") {
            config.generative.model = model;
        }
        if let Ok(url) = std::env::var("PLAYFORGE_BRIDGE_URL") {
            config.bridge.enabled = true;
            config.bridge.url = Some(url);
        }
        if let Ok(flag) = std::env::var("PLAYFORGE_REQUIRE_GENERATIVE_HTML") {
            config.require_generative_html = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".playforge")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for backend in std::iter::once(&self.generative).chain(&self.fallbacks) {
            if !(0.0..=2.0).contains(&backend.temperature) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
            if backend.endpoint.trim().is_empty() {
                return Err(ConfigError::ValidationError("endpoint must not be empty".into()));
            }
        }
        for capability in &self.capabilities {
            if !matches!(capability.kind.as_str(), "search" | "ingest" | "context") {
                return Err(ConfigError::ValidationError(format!(
                    "capability '{}' has unknown kind '{}'",
                    capability.id, capability.kind
                )));
            }
            if capability.id.trim().is_empty() {
                return Err(ConfigError::ValidationError("capability id must not be empty".into()));
            }
        }
        if self.network.search_result_limit == 0 {
            return Err(ConfigError::ValidationError("search_result_limit must be > 0".into()));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for first-run setup).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generative: GenerativeConfig::default(),
            fallbacks: vec![],
            bridge: BridgeConfig::default(),
            pdf_bridge: BridgeConfig::default(),
            require_generative_html: false,
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            capabilities: vec![],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.generative.is_configured());
        assert!(!config.bridge.is_configured());
        assert_eq!(config.network.search_result_limit, 12);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.generative.model, config.generative.model);
        assert_eq!(parsed.network.fetch_timeout_secs, config.network.fetch_timeout_secs);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            generative: GenerativeConfig { temperature: 5.0, ..Default::default() },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_capability_kind_rejected() {
        let config = AppConfig {
            capabilities: vec![ExternalCapabilityConfig {
                id: "x".into(),
                kind: "render".into(),
                label: String::new(),
                url: "https://example.org".into(),
                priority: 100,
                enabled: true,
                timeout_secs: 30,
            }],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn capability_parsing() {
        let toml_str = r#"
require_generative_html = true

[generative]
api_key = "sk-test"
model = "custom-model"

[[capabilities]]
id = "corp-search"
kind = "search"
label = "Corporate index"
url = "https://search.internal/api"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.require_generative_html);
        assert!(config.generative.is_configured());
        assert_eq!(config.capabilities.len(), 1);
        assert_eq!(config.capabilities[0].kind, "search");
        assert!(config.capabilities[0].enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            generative: GenerativeConfig {
                api_key: Some("sk-secret".into()),
                ..Default::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
