//! Configuration loading, validation, and management for RagLoop.
//!
//! Loads configuration from `~/.ragloop/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ragloop/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for every model call
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// System message sent with every prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Vector store connection
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Retrieval loop tuning
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Terminal display settings
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_system_prompt() -> String {
    "You are a helpful assistant.".into()
}
fn default_true() -> bool {
    true
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
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("system_prompt", &self.system_prompt)
            .field("providers", &self.providers)
            .field("vector_store", &self.vector_store)
            .field("retrieval", &self.retrieval)
            .field("display", &self.display)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Where documents are retrieved from.
#[derive(Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// "weaviate" or "in_memory"
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base URL of the Weaviate HTTP endpoint
    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Collection (class) searched with nearText
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Property holding the document text
    #[serde(default = "default_content_property")]
    pub content_property: String,

    /// JSON corpus for the in_memory backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_path: Option<PathBuf>,
}

fn default_backend() -> String {
    "weaviate".into()
}
fn default_store_url() -> String {
    "http://localhost:8080".into()
}
fn default_collection() -> String {
    "Documents".into()
}
fn default_content_property() -> String {
    "content".into()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_store_url(),
            api_key: None,
            collection: default_collection(),
            content_property: default_content_property(),
            documents_path: None,
        }
    }
}

impl std::fmt::Debug for VectorStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("collection", &self.collection)
            .field("content_property", &self.content_property)
            .field("documents_path", &self.documents_path)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum retrieval rounds per user turn
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Documents requested per round
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Token ceiling for context embedded in prompts
    #[serde(default = "default_context_token_limit")]
    pub context_token_limit: usize,

    /// Transcript entries shown to the model
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    /// Pause after a rejected round before searching again
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// "cl100k_base" or "estimate"
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,

    /// Whether each round is appended to `log_path`
    #[serde(default = "default_true")]
    pub log_retrievals: bool,

    /// Append-only retrieval log
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

fn default_max_retries() -> u32 {
    2
}
fn default_result_limit() -> usize {
    8
}
fn default_context_token_limit() -> usize {
    2500
}
fn default_history_turns() -> usize {
    10
}
fn default_retry_delay_ms() -> u64 {
    1200
}
fn default_tokenizer() -> String {
    "cl100k_base".into()
}
fn default_log_path() -> PathBuf {
    PathBuf::from("retrieval_logs.txt")
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            result_limit: default_result_limit(),
            context_token_limit: default_context_token_limit(),
            history_turns: default_history_turns(),
            retry_delay_ms: default_retry_delay_ms(),
            tokenizer: default_tokenizer(),
            log_retrievals: true,
            log_path: default_log_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Print answers character by character
    #[serde(default = "default_true")]
    pub typewriter: bool,

    #[serde(default = "default_char_delay_ms")]
    pub char_delay_ms: u64,
}

fn default_char_delay_ms() -> u64 {
    15
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            typewriter: true,
            char_delay_ms: default_char_delay_ms(),
        }
    }
}

const BACKENDS: &[&str] = &["weaviate", "in_memory"];
const TOKENIZERS: &[&str] = &["cl100k_base", "estimate"];

impl AppConfig {
    /// Load configuration from the default path (~/.ragloop/config.toml).
    ///
    /// Also checks environment variables:
    /// - `RAGLOOP_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `RAGLOOP_PROVIDER`, `RAGLOOP_MODEL`
    /// - `WEAVIATE_URL`, `WEAVIATE_API_KEY`, `RAGLOOP_COLLECTION`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("RAGLOOP_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(provider) = lookup("RAGLOOP_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("RAGLOOP_MODEL") {
            self.default_model = model;
        }
        if let Some(url) = lookup("WEAVIATE_URL") {
            self.vector_store.url = url;
        }
        if self.vector_store.api_key.is_none() {
            self.vector_store.api_key = lookup("WEAVIATE_API_KEY");
        }
        if let Some(collection) = lookup("RAGLOOP_COLLECTION") {
            self.vector_store.collection = collection;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retrieval.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_retries must be at least 1".into(),
            ));
        }

        if self.retrieval.result_limit == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.result_limit must be at least 1".into(),
            ));
        }

        if self.retrieval.context_token_limit == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.context_token_limit must be at least 1".into(),
            ));
        }

        if !BACKENDS.contains(&self.vector_store.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown vector_store.backend '{}' (expected one of: {})",
                self.vector_store.backend,
                BACKENDS.join(", ")
            )));
        }

        if !TOKENIZERS.contains(&self.retrieval.tokenizer.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown retrieval.tokenizer '{}' (expected one of: {})",
                self.retrieval.tokenizer,
                TOKENIZERS.join(", ")
            )));
        }

        Ok(())
    }

    /// Model for the default provider: its own `default_model` when set,
    /// otherwise the top-level one.
    pub fn active_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            providers: HashMap::new(),
            vector_store: VectorStoreConfig::default(),
            retrieval: RetrievalConfig::default(),
            display: DisplayConfig::default(),
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
        assert_eq!(config.default_model, "gpt-3.5-turbo");
        assert_eq!(config.retrieval.max_retries, 2);
        assert_eq!(config.retrieval.result_limit, 8);
        assert_eq!(config.retrieval.context_token_limit, 2500);
        assert_eq!(config.retrieval.retry_delay_ms, 1200);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.vector_store.collection, config.vector_store.collection);
        assert_eq!(parsed.retrieval.log_path, config.retrieval.log_path);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
default_model = "gpt-4o-mini"

[vector_store]
collection = "god1"

[retrieval]
max_retries = 3
retry_delay_ms = 0
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.vector_store.collection, "god1");
        assert_eq!(config.vector_store.content_property, "content");
        assert_eq!(config.retrieval.max_retries, 3);
        assert_eq!(config.retrieval.retry_delay_ms, 0);
        assert_eq!(config.retrieval.result_limit, 8);
    }

    #[test]
    fn zero_rounds_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.vector_store.backend = "pinecone".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pinecone"));
    }

    #[test]
    fn unknown_tokenizer_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.tokenizer = "p50k".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().default_provider, "openai");
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = \"warm\"").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            "RAGLOOP_MODEL" => Some("gpt-4o".into()),
            "WEAVIATE_URL" => Some("http://10.0.0.5:8080".into()),
            "RAGLOOP_COLLECTION" => Some("god1".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.vector_store.url, "http://10.0.0.5:8080");
        assert_eq!(config.vector_store.collection, "god1");
    }

    #[test]
    fn ragloop_key_wins_over_openai_key() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "RAGLOOP_API_KEY" => Some("sk-ragloop".into()),
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-ragloop"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.vector_store.api_key = Some("wv-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("wv-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-3.5-turbo"));
        assert!(toml_str.contains("retrieval_logs.txt"));
    }

    #[test]
    fn active_model_prefers_provider_override() {
        let mut config = AppConfig::default();
        assert_eq!(config.active_model(), "gpt-3.5-turbo");

        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("gpt-4o-mini".into()),
            },
        );
        assert_eq!(config.active_model(), "gpt-4o-mini");
    }
}
