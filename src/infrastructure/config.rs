use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::DEFAULT_PAGE_SIZE;

const APP_DIR: &str = "conveyor-filters";

/// TOML configuration for the filter tool
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct DatabaseConfig {
    /// Empty means the platform data directory.
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub user: Option<String>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse TOML config")?;

        Ok(config)
    }

    /// Explicit path if given, else the platform config file if it exists, else defaults.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                debug!(?path, "Loading config");
                Self::load(path)
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        if !self.database.path.is_empty() {
            return Ok(PathBuf::from(&self.database.path));
        }
        default_database_path()
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

pub fn default_database_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Could not find data directory")?;
    Ok(data_dir.join(APP_DIR).join("filters.db"))
}
