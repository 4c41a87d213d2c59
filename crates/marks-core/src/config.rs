//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/marks/config.toml)
//! 3. Environment variables (MARKS_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "MARKS";

/// Name of the dataset file inside `data_dir`
const DATA_FILE: &str = "data.json";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the dataset file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the HTTP server binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Category assigned to imported bookmarks that carry none
    #[serde(default)]
    pub import_category_id: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen: default_listen(),
            import_category_id: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MARKS_DATA_DIR, MARKS_LISTEN, MARKS_IMPORT_CATEGORY_ID)
    /// 2. Config file (~/.config/marks/config.toml or MARKS_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::load_from_str(&content)
            .with_context(|| format!("Failed to load config file: {:?}", path))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Configuration rooted at `data_dir` with everything else defaulted
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_LISTEN", ENV_PREFIX)) {
            if !val.is_empty() {
                self.listen = val;
            }
        }

        // Empty string clears the fallback category
        if let Ok(val) = std::env::var(format!("{}_IMPORT_CATEGORY_ID", ENV_PREFIX)) {
            self.import_category_id = if val.trim().is_empty() {
                None
            } else {
                Some(val.trim().parse().with_context(|| {
                    format!("{}_IMPORT_CATEGORY_ID is not an integer: {:?}", ENV_PREFIX, val)
                })?)
            };
        }

        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MARKS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marks")
            .join("config.toml")
    }

    /// Get the path to the dataset file
    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marks")
}

fn default_listen() -> String {
    "0.0.0.0:5000".to_string()
}
