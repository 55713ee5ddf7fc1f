//! Path utilities

use std::path::PathBuf;

use crate::{ConfigError, Result};

/// Per-user configuration directory (~/.config/kotto)
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".config").join("kotto"))
        .ok_or(ConfigError::NoHome)
}

/// Configuration file location
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Where compiled declaration artifacts are cached
pub fn artifacts_dir() -> Result<PathBuf> {
    Ok(config_dir()?.join("artifacts"))
}
