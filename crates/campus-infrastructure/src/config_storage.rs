//! Client configuration file storage.
//!
//! Loads `~/.config/campus-admin/config.toml` and lets environment variables
//! override what the file says.

use crate::paths::CampusPaths;
use campus_core::config::ClientConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const ENV_API_BASE: &str = "CAMPUS_API_BASE";
pub const ENV_API_TOKEN: &str = "CAMPUS_API_TOKEN";
pub const ENV_API_TIMEOUT_SECS: &str = "CAMPUS_API_TIMEOUT_SECS";

/// Errors that can occur during config storage operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config directory not found.
    #[error("Could not determine home directory")]
    ConfigDirNotFound,

    /// File I/O error.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Storage for the client configuration file (config.toml).
///
/// A missing file is not an error: defaults are returned and the file is
/// only written by [`ConfigStorage::save`].
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a storage for the default path.
    pub fn new() -> Result<Self, ConfigError> {
        let path = CampusPaths::config_file().map_err(|_| ConfigError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    /// Creates a storage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, or defaults when it does not exist.
    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the file and applies `CAMPUS_API_*` environment overrides.
    pub fn load_with_env(&self) -> Result<ClientConfig, ConfigError> {
        let config = self.load()?;
        Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
    }

    /// Writes the configuration, creating the directory if needed.
    pub fn save(&self, config: &ClientConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(config)?;
        fs::write(&self.path, content).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Applies overrides looked up through `lookup` (the process environment in
/// [`ConfigStorage::load_with_env`]). Blank values are ignored.
pub fn apply_env_overrides<F>(mut config: ClientConfig, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(base_url) = lookup(ENV_API_BASE) {
        config.base_url = base_url;
    }
    if let Some(token) = lookup(ENV_API_TOKEN) {
        config.token = Some(token);
    }
    if let Some(raw) = lookup(ENV_API_TIMEOUT_SECS) {
        match raw.trim().parse::<u64>() {
            Ok(secs) => config.timeout_secs = secs,
            Err(_) => warn!(value = %raw, "Ignoring invalid {}", ENV_API_TIMEOUT_SECS),
        }
    }
    config
}
