//! Add-on configuration, read from the supervisor-provided options file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Where the supervisor mounts the add-on options.
pub const DEFAULT_CONFIG_PATH: &str = "/data/options.json";

fn default_backup_dir() -> String {
    "/backup".into()
}

fn default_remote_dir() -> String {
    "/snapshots".into()
}

/// Errors loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// User-facing add-on options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enables debug-level log output.
    #[serde(default)]
    pub debug: bool,

    /// Dropbox OAuth access token. Empty disables the Dropbox target.
    #[serde(default)]
    pub dropbox_access_token: String,

    /// Directory inside Dropbox to store snapshot archives.
    #[serde(default = "default_remote_dir")]
    pub dropbox_dir: String,

    /// Name remote files after the snapshot's display name instead of its slug.
    #[serde(default)]
    pub use_filename: bool,

    /// Local retention: keep only this many snapshots after a backup run.
    #[serde(default)]
    pub keep_last: Option<usize>,

    /// Directory where the supervisor writes snapshot archives.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            dropbox_access_token: String::new(),
            dropbox_dir: default_remote_dir(),
            use_filename: false,
            keep_last: None,
            backup_dir: default_backup_dir(),
        }
    }
}

impl Config {
    /// Loads configuration from a JSON options file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
