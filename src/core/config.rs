//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::bridge::DEFAULT_LEG_TIMEOUT;

/// Configuration for the translator handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Workers in the inference service pool
    pub worker_count: usize,
    /// Wait budget per translation leg
    pub timeout_ms: u64,
    /// Directory scanned for per-pair model folders
    pub models_dir: PathBuf,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            timeout_ms: DEFAULT_LEG_TIMEOUT.as_millis() as u64,
            models_dir: PathBuf::from("models"),
        }
    }
}

impl TranslatorConfig {
    /// Load configuration from `NUM_WORKERS`, `TIMEOUT_MS` and `MODELS_DIR`
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("worker_count", defaults.worker_count as i64)?
            .set_default("timeout_ms", defaults.timeout_ms as i64)?
            .set_default("models_dir", defaults.models_dir.display().to_string())?
            .set_override_option("worker_count", std::env::var("NUM_WORKERS").ok())?
            .set_override_option("timeout_ms", std::env::var("TIMEOUT_MS").ok())?
            .set_override_option("models_dir", std::env::var("MODELS_DIR").ok())?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_count == 0 {
            return Err(anyhow::anyhow!("worker_count must be greater than 0"));
        }

        if self.timeout_ms == 0 {
            return Err(anyhow::anyhow!("timeout_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Wait budget as a duration
    pub fn leg_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// HTTP front-end configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Shared secret; empty disables authentication
    pub api_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_key: String::new(),
        }
    }
}

impl ServerConfig {
    /// Load from `IP`, `PORT` and `API_KEY`
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("api_key", defaults.api_key)?
            .set_override_option("host", std::env::var("IP").ok())?
            .set_override_option("port", std::env::var("PORT").ok())?
            .set_override_option("api_key", std::env::var("API_KEY").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// `host:port` string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether requests must carry the API key
    pub fn auth_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}
