//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files including bind address, LLM endpoint,
//! document store location, and pipeline tuning. Every field has a default,
//! so an empty file is a valid configuration.

use projectbrain_extractor::PipelineConfig;
use projectbrain_llm::groq;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// API key environment variable not set
    #[error("Environment variable {0} is not set")]
    MissingApiKey(String),

    /// Field failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Chat completion backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chunk store
    #[serde(default)]
    pub store: StoreConfig,

    /// Retrieval sizes, timeouts and extraction schema
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Chat completion backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Per-request HTTP timeout
    pub timeout_secs: u64,

    /// Attempts per call, including the first
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: groq::DEFAULT_ENDPOINT.to_string(),
            model: groq::DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: groq::DEFAULT_TIMEOUT_SECS,
            max_retries: groq::DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey(self.api_key_env.clone())),
        }
    }
}

/// Chunk store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("projectbrain.db"),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            llm: LlmConfig::default(),
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address is empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model is empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.pipeline.validate().map_err(ConfigError::Invalid)?;

        // The provider must give up before the pipeline stops waiting on it
        let worst_case = groq::worst_case_duration(
            Duration::from_secs(self.llm.timeout_secs),
            self.llm.max_retries,
        );
        if worst_case > self.pipeline.llm_timeout() {
            return Err(ConfigError::Invalid(format!(
                "llm.timeout_secs x llm.max_retries plus backoff ({}s) exceeds pipeline.llm_timeout_secs ({}s)",
                worst_case.as_secs(),
                self.pipeline.llm_timeout_secs
            )));
        }
        Ok(())
    }

    /// Create a configuration for tests: loopback, in-memory store
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            store: StoreConfig {
                database_path: PathBuf::from(":memory:"),
            },
            ..Default::default()
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
