//! Configuration management for jobdeck.
//!
//! Loads configuration from ${JOBDECK_HOME}/config.toml with sensible defaults.
//! The API base URL is the only environment-dependent value the core needs;
//! everything else has a default.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ApiResult};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the marketplace REST API.
    pub api_base_url: String,

    /// Client-side timeout for every outgoing request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    const DEFAULT_BASE_URL: &str = "https://api.jobdeck.app/api";
    /// Timeouts classify as network failures; 12s keeps slow mobile links
    /// usable without letting a dead connection hang a toggle forever.
    const DEFAULT_TIMEOUT_SECS: u64 = 12;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> ApiResult<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the configured base URL is not a valid URL.
    pub fn load_from(path: &Path) -> ApiResult<Self> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path).map_err(|e| {
                ApiError::storage(format!("failed to read config from {}: {e}", path.display()))
            })?;
            toml::from_str(&contents).map_err(|e| {
                ApiError::storage(format!("failed to parse config from {}: {e}", path.display()))
            })?
        } else {
            Config::default()
        };

        url::Url::parse(&config.api_base_url).map_err(|e| {
            ApiError::storage(format!("invalid api_base_url '{}': {e}", config.api_base_url))
        })?;

        Ok(config)
    }

    /// Writes a default config file if none exists.
    ///
    /// Returns true if a file was created.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn init_default() -> ApiResult<bool> {
        let path = paths::config_path();
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ApiError::storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&path, default_config_template()).map_err(|e| {
            ApiError::storage(format!("failed to write {}: {e}", path.display()))
        })?;
        Ok(true)
    }

    /// Returns the request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

/// Default config.toml contents for `config init`.
fn default_config_template() -> String {
    let defaults = Config::default();
    format!(
        "# jobdeck configuration\n\
         \n\
         # Base URL of the marketplace REST API\n\
         api_base_url = \"{}\"\n\
         \n\
         # Client-side timeout for outgoing requests, in seconds\n\
         request_timeout_secs = {}\n",
        defaults.api_base_url, defaults.request_timeout_secs
    )
}

pub mod paths {
    //! Path resolution for jobdeck configuration and data directories.
    //!
    //! JOBDECK_HOME resolution order:
    //! 1. JOBDECK_HOME environment variable (if set)
    //! 2. ~/.config/jobdeck (default)

    use std::path::PathBuf;

    /// Returns the jobdeck home directory.
    ///
    /// Checks JOBDECK_HOME env var first, falls back to ~/.config/jobdeck
    pub fn jobdeck_home() -> PathBuf {
        if let Ok(home) = std::env::var("JOBDECK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("jobdeck"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        jobdeck_home().join("config.toml")
    }

    /// Returns the path to the persisted credential document.
    pub fn credentials_path() -> PathBuf {
        jobdeck_home().join("credentials.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: defaults when no file exists.
    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.request_timeout_secs, 12);
        assert!(config.api_base_url.starts_with("https://"));
    }

    /// Test: partial file keeps defaults for missing fields.
    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"https://staging.example.com/api\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "https://staging.example.com/api");
        assert_eq!(config.request_timeout_secs, 12);
    }

    /// Test: invalid base URL is rejected at load time.
    #[test]
    fn test_load_rejects_invalid_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"not a url\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.message.contains("invalid api_base_url"));
    }

    /// Test: base_url strips the trailing slash.
    #[test]
    fn test_base_url_trailing_slash() {
        let config = Config {
            api_base_url: "https://api.example.com/api/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.base_url(), "https://api.example.com/api");
    }

    /// Test: the default template parses back to the defaults.
    #[test]
    fn test_default_template_roundtrip() {
        let parsed: Config = toml::from_str(&default_config_template()).unwrap();
        assert_eq!(parsed.request_timeout_secs, Config::default().request_timeout_secs);
        assert_eq!(parsed.api_base_url, Config::default().api_base_url);
    }
}
