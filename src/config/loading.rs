//! Configuration loading functionality.
//!
//! Resolves the config path, creates a default file when none exists, parses
//! the TOML and runs validation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Get the configuration file path.
///
/// `config_dir` is the directory passed with `--config`, if any.
pub fn get_config_path(config_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = config_dir {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration, creating a default file if none exists.
pub fn load(config_dir: Option<&Path>) -> Result<Config> {
    let config_path = get_config_path(config_dir)?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
        log_block_start!(
            "Created default configuration at {}",
            private_path(&config_path)
        );
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load configuration from a specific path.
///
/// Unlike [`load`], this never creates the file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;

    Ok(config)
}
