//! Unified path management for ragdesk configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/ragdesk/           # Config directory (platform config dir)
//! ├── config.toml              # Client configuration
//! └── logs/                    # Application logs
//!     └── ragdesk.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "ragdesk";
const CONFIG_FILE: &str = "config.toml";
const LOG_DIR: &str = "logs";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for ragdesk.
pub struct RagdeskPaths;

impl RagdeskPaths {
    /// Returns the ragdesk configuration directory (e.g., `~/.config/ragdesk/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the default log directory.
    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(LOG_DIR))
    }
}
