//! Client configuration.
//!
//! Configuration priority: command-line flags > environment variables >
//! `~/.config/ragdesk/config.toml` > built-in defaults. Flags are applied by
//! the binary; this module handles the file and the environment.

use crate::paths::RagdeskPaths;
use ragdesk_core::catalog::{DEFAULT_MODEL, ModelInfo, default_catalog};
use ragdesk_core::error::{RagdeskError, Result};
use ragdesk_core::session::{QueryMode, Settings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Environment variables read by [`ClientConfig::apply_env`].
pub mod env_keys {
    pub const BACKEND_URL: &str = "RAGDESK_BACKEND_URL";
    /// Name used by older deployments; consulted when `RAGDESK_BACKEND_URL` is unset.
    pub const LEGACY_BACKEND_URL: &str = "BACKEND_URL";
    pub const QUERY_TIMEOUT_SECS: &str = "RAGDESK_QUERY_TIMEOUT_SECS";
    pub const REQUEST_TIMEOUT_SECS: &str = "RAGDESK_REQUEST_TIMEOUT_SECS";
    pub const MODE: &str = "RAGDESK_MODE";
    pub const MODEL: &str = "RAGDESK_MODEL";
}

/// Root configuration structure for config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the question-answering backend.
    pub backend_url: String,
    /// Timeout for `POST /query`, in seconds.
    pub query_timeout_secs: u64,
    /// Timeout for `POST /reset` and `POST /config`, in seconds.
    pub request_timeout_secs: u64,
    /// Mode a new or reset session starts in.
    pub default_mode: QueryMode,
    /// Model a new or reset session starts with. `None` hides model choice.
    pub default_model: Option<String>,
    /// Models offered for selection.
    pub models: Vec<ModelInfo>,
    /// Directory for log files. Defaults to `~/.config/ragdesk/logs`.
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            default_mode: QueryMode::Python,
            default_model: Some(DEFAULT_MODEL.to_string()),
            models: default_catalog(),
            log_dir: None,
        }
    }
}

impl ClientConfig {
    /// Loads `~/.config/ragdesk/config.toml` and applies the process environment.
    pub fn load() -> Result<Self> {
        let path = RagdeskPaths::config_file().map_err(|e| RagdeskError::config(e.to_string()))?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file. A missing or blank file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: Self = toml::from_str(&content).map_err(|e| {
            RagdeskError::config(format!(
                "Failed to parse configuration file at {}: {}",
                path.display(),
                e
            ))
        })?;

        if config.models.is_empty() {
            config.models = default_catalog();
        }

        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Overrides fields from environment variables.
    ///
    /// `lookup` is the variable source; pass `|k| std::env::var(k).ok()` for
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) =
            lookup(env_keys::BACKEND_URL).or_else(|| lookup(env_keys::LEGACY_BACKEND_URL))
        {
            self.backend_url = url;
        }

        if let Some(value) = lookup(env_keys::QUERY_TIMEOUT_SECS) {
            self.query_timeout_secs = parse_secs(env_keys::QUERY_TIMEOUT_SECS, &value)?;
        }

        if let Some(value) = lookup(env_keys::REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_secs(env_keys::REQUEST_TIMEOUT_SECS, &value)?;
        }

        if let Some(value) = lookup(env_keys::MODE) {
            self.default_mode = value.parse().map_err(|_| {
                RagdeskError::config(format!("{}: unknown mode '{}'", env_keys::MODE, value))
            })?;
        }

        if let Some(value) = lookup(env_keys::MODEL) {
            let value = value.trim();
            self.default_model = (!value.is_empty()).then(|| value.to_string());
        }

        Ok(())
    }

    /// Checks invariants and normalises the backend URL.
    pub fn validate(&mut self) -> Result<()> {
        let url = self.backend_url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(RagdeskError::config("backend_url must not be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RagdeskError::config(format!(
                "backend_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        self.backend_url = url.to_string();

        if self.query_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(RagdeskError::config("timeouts must be greater than zero"));
        }

        Ok(())
    }

    /// Settings a new or reset session starts with.
    pub fn default_settings(&self) -> Settings {
        Settings::new(self.default_mode, self.default_model.clone())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolved log directory.
    pub fn resolved_log_dir(&self) -> Result<PathBuf> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => RagdeskPaths::log_dir().map_err(|e| RagdeskError::config(e.to_string())),
        }
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| RagdeskError::config(format!("{}: expected seconds, got '{}'", key, value)))
}
