//! Core configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Notification feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// How many of the newest complaints are eligible to notify
    #[serde(default = "default_window")]
    pub window: usize,

    /// Drop ledger entries once their keys can no longer be derived
    #[serde(default)]
    pub prune: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            prune: false,
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the SQLite databases
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// Defaults
fn default_window() -> usize { 5 }
fn default_data_dir() -> PathBuf { PathBuf::from("./data") }

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))
    }
}
