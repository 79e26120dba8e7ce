//! Settings file locations

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the settings file location
pub const SETTINGS_ENV_VAR: &str = "DBSTUDIO_SETTINGS";

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join("dbstudio"))
}

pub fn data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .context("Could not determine data directory")
        .map(|p| p.join("dbstudio"))
}

pub fn logs_dir() -> Result<PathBuf> {
    data_dir().map(|p| p.join("logs"))
}

/// `$DBSTUDIO_SETTINGS`, else `<config_dir>/dbstudio/settings.toml`
pub fn settings_file() -> Result<PathBuf> {
    match std::env::var_os(SETTINGS_ENV_VAR) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => config_dir().map(|p| p.join("settings.toml")),
    }
}
