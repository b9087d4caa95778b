//! Project configuration file support for sesstriage.
//!
//! Loads configuration from `sesstriage.toml` in the working directory, falling
//! back to the user config directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use sesstriage_logging::LogFormat;

/// Configuration loaded from `sesstriage.toml`
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    /// Proximity window for folding single-visit sessions, in seconds
    pub window_secs: Option<i64>,
    /// File name prefix of session records
    pub session_prefix: Option<String>,
    /// Number of classification workers
    pub workers: Option<usize>,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "sesstriage.toml";

impl TriageConfig {
    /// Load configuration from an explicit path. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Look for `sesstriage.toml` in `working_dir`, then in the user config directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if a file exists and parses successfully
    /// - `Ok(None)` if no file exists
    /// - `Err(...)` if a file exists but fails to parse (hard error)
    pub fn discover(working_dir: &Path) -> Result<Option<Self>> {
        for path in Self::candidates(working_dir) {
            if path.exists() {
                return Self::load_from(&path).map(Some);
            }
        }
        Ok(None)
    }

    fn candidates(working_dir: &Path) -> Vec<PathBuf> {
        let mut paths = vec![working_dir.join(CONFIG_FILE_NAME)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("sesstriage").join(CONFIG_FILE_NAME));
        }
        paths
    }
}
