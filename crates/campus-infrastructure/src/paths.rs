//! Path management for the campus admin configuration.
//!
//! ```text
//! ~/.config/campus-admin/      # Config directory (platform config dir)
//! └── config.toml              # Connection settings and bearer token
//! ```

use std::path::PathBuf;
use thiserror::Error;

const APP_DIR_NAME: &str = "campus-admin";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur during path resolution.
#[derive(Error, Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

pub struct CampusPaths;

impl CampusPaths {
    /// Returns the configuration directory (e.g. `~/.config/campus-admin/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path of `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Self::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
    }
}
