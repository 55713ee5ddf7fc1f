//! Configuration management for kotto
//!
//! Persists the model provider settings as JSON under the user's config
//! directory.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{artifacts_dir, config_dir, config_path};

/// Environment variable that overrides the stored API key
pub const KEY_ENV: &str = "OPENAI_KEY";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not locate the home directory")]
    NoHome,

    #[error("unknown configuration attribute '{0}'")]
    UnknownAttribute(String),

    #[error("'{0}' must not be empty")]
    EmptyValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// OpenAI connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            model: default_model(),
            api_base: None,
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
}

impl Config {
    /// Attributes accepted by [`Config::set`]
    pub const ATTRIBUTES: &'static [&'static str] =
        &["openai.key", "openai.model", "openai.api_base"];

    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path()?;
        Self::load_from(&path).await
    }

    /// Load from a specific location; a missing file yields defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path()?;
        self.save_to(&path).await
    }

    /// Save to a specific location, creating its directory
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("saving config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        info!("config written to {:?}", path);
        Ok(())
    }

    /// Set one attribute by its dotted name
    pub fn set(&mut self, attr: &str, value: &str) -> Result<()> {
        match attr {
            "openai.key" => self.openai.key = non_empty(attr, value)?,
            "openai.model" => self.openai.model = non_empty(attr, value)?,
            "openai.api_base" => {
                let value = value.trim();
                self.openai.api_base = (!value.is_empty()).then(|| value.to_string());
            }
            _ => return Err(ConfigError::UnknownAttribute(attr.to_string())),
        }
        Ok(())
    }

    /// API key, from the environment first, then from the file
    pub fn api_key(&self) -> Option<String> {
        std::env::var(KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| Some(self.openai.key.clone()).filter(|key| !key.is_empty()))
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn model(&self) -> &str {
        &self.openai.model
    }

    pub fn api_base(&self) -> Option<&str> {
        self.openai.api_base.as_deref()
    }
}

fn non_empty(attr: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::EmptyValue(attr.to_string()));
    }
    Ok(value.to_string())
}
