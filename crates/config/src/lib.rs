//! Configuration loading, validation, and management for windlass.
//!
//! Loads configuration from `~/.windlass/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.windlass/config.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Reasoning model endpoint configuration
    #[serde(default)]
    pub reasoner: ReasonerConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Workflow iteration and sizing policy
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
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
            .field("reasoner", &self.reasoner)
            .field("gateway", &self.gateway)
            .field("workflow", &self.workflow)
            .field("tools", &self.tools)
            .finish()
    }
}

/// Connection settings for the reasoning model server.
#[derive(Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    /// Base URL of an OpenAI-compatible chat completions server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// API key, if the server requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434/v1".into()
}
fn default_model() -> String {
    "qwen3:14b".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for ReasonerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasonerConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub allow_public_bind: bool,
}

fn default_port() -> u16 {
    8891
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allow_public_bind: false,
        }
    }
}

/// Iteration and sizing policy for the research loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Hard ceiling on research iterations before forced finalization
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Reduced ceiling applied in thinking mode
    #[serde(default = "default_thinking_iterations")]
    pub thinking_iterations: u32,

    /// Upper bound on graph node executions per request
    #[serde(default = "default_step_budget")]
    pub step_budget: u32,
}

fn default_max_iterations() -> u32 {
    4
}
fn default_thinking_iterations() -> u32 {
    2
}
fn default_step_budget() -> u32 {
    64
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            thinking_iterations: default_thinking_iterations(),
            step_budget: default_step_budget(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory where the create_file tool writes
    #[serde(default = "default_drop_dir")]
    pub drop_dir: String,

    /// Extensions the create_file tool accepts
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Byte cap on fetched file bodies
    #[serde(default = "default_fetch_max_bytes")]
    pub fetch_max_bytes: usize,

    /// Result cap for web search
    #[serde(default = "default_search_results")]
    pub search_results: usize,
}

fn default_drop_dir() -> String {
    "./drop".into()
}
fn default_allowed_extensions() -> Vec<String> {
    vec!["txt".into(), "md".into(), "csv".into(), "json".into()]
}
fn default_fetch_max_bytes() -> usize {
    262_144
}
fn default_search_results() -> usize {
    5
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            drop_dir: default_drop_dir(),
            allowed_extensions: default_allowed_extensions(),
            fetch_max_bytes: default_fetch_max_bytes(),
            search_results: default_search_results(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.windlass/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `WINDLASS_API_KEY`
    /// - `WINDLASS_BASE_URL`
    /// - `WINDLASS_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.reasoner.api_key.is_none() {
            config.reasoner.api_key = std::env::var("WINDLASS_API_KEY").ok();
        }
        if let Ok(base_url) = std::env::var("WINDLASS_BASE_URL") {
            config.reasoner.base_url = base_url;
        }
        if let Ok(model) = std::env::var("WINDLASS_MODEL") {
            config.reasoner.model = model;
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
        dirs_home().join(".windlass")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reasoner.temperature < 0.0 || self.reasoner.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "reasoner.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.workflow.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.max_iterations must be at least 1".into(),
            ));
        }

        if self.workflow.thinking_iterations > self.workflow.max_iterations {
            return Err(ConfigError::ValidationError(
                "workflow.thinking_iterations cannot exceed workflow.max_iterations".into(),
            ));
        }

        if self.workflow.step_budget < self.workflow.max_iterations * 4 {
            return Err(ConfigError::ValidationError(
                "workflow.step_budget is too small for the configured max_iterations".into(),
            ));
        }

        if self.reasoner.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "reasoner.base_url must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `windlass onboard`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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
