//! Configuration management for tusk.
//!
//! Loads configuration from ${TUSK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote task API.
    pub base_url: Option<String>,

    /// Request timeout in seconds (0 disables).
    pub request_timeout_secs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Default API base URL (local development server).
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 30;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the default config template to `path`.
    /// Fails if the file already exists (no silent overwrite).
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Resolves the effective base URL with precedence: env > config > default.
    ///
    /// `TUSK_BASE_URL` overrides the config file; empty/whitespace values are
    /// treated as unset at every level.
    ///
    /// # Errors
    /// Returns an error if the resolved URL is not well-formed.
    pub fn base_url(&self) -> Result<String> {
        if let Ok(env_url) = std::env::var("TUSK_BASE_URL") {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        if let Some(config_url) = self.base_url.as_deref() {
            let trimmed = config_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        Ok(Self::DEFAULT_BASE_URL.to_string())
    }

    /// Returns the request timeout, or None when disabled.
    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        (self.request_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(u64::from(self.request_timeout_secs)))
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    Ok(())
}

/// Returns the default config file template with commented options.
fn default_config_template() -> &'static str {
    r#"# tusk configuration

# Base URL of the remote task API.
# Overridden by the TUSK_BASE_URL environment variable.
# base_url = "http://localhost:8000"

# Request timeout in seconds (0 disables).
# request_timeout_secs = 30
"#
}

pub mod paths {
    //! Path resolution for tusk configuration and data directories.
    //!
    //! TUSK_HOME resolution order:
    //! 1. TUSK_HOME environment variable (if set)
    //! 2. ~/.config/tusk (default)

    use std::path::PathBuf;

    /// Returns the tusk home directory.
    ///
    /// Checks TUSK_HOME env var first, falls back to ~/.config/tusk
    pub fn tusk_home() -> PathBuf {
        if let Ok(home) = std::env::var("TUSK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("tusk"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        tusk_home().join("config.toml")
    }

    /// Returns the path to the session.json file.
    pub fn session_path() -> PathBuf {
        tusk_home().join("session.json")
    }
}
