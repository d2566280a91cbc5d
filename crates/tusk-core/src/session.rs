//! Session (token) storage.
//!
//! Stores the access/refresh token pair in `${TUSK_HOME}/session.json` with
//! restricted permissions (0600). Tokens are never logged or displayed in full.
//!
//! Storage is best-effort by contract: `save` and `clear` log failures and
//! carry on, and the token getters return an empty string on absence or read
//! failure. Callers never have to handle a storage error mid-flow.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// A stored session: the access/refresh token pair.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The access token (short-lived), sent as the bearer credential.
    pub access_token: String,
    /// The refresh token (long-lived).
    pub refresh_token: String,
}

/// Persistent store for the current session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store backed by the default session path.
    pub fn new() -> Self {
        Self::at(paths::session_path())
    }

    /// Creates a store backed by a specific file path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the stored access token, or an empty string if absent
    /// or unreadable.
    pub fn access_token(&self) -> String {
        self.read().map(|s| s.access_token).unwrap_or_default()
    }

    /// Returns the stored refresh token, or an empty string if absent
    /// or unreadable.
    pub fn refresh_token(&self) -> String {
        self.read().map(|s| s.refresh_token).unwrap_or_default()
    }

    /// Returns true if a non-empty access token is stored.
    pub fn has_session(&self) -> bool {
        !self.access_token().is_empty()
    }

    /// Persists both tokens, overwriting any existing session.
    ///
    /// Best-effort: storage failures are logged and swallowed.
    pub fn save(&self, access_token: &str, refresh_token: &str) {
        if let Err(e) = self.try_save(access_token, refresh_token) {
            tracing::warn!("Failed to persist session to {}: {e:#}", self.path.display());
        }
    }

    /// Removes the stored session. Returns whether a session file existed.
    ///
    /// Best-effort: removal failures are logged and swallowed.
    pub fn clear(&self) -> bool {
        let existed = self.path.exists();
        if existed && let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to clear session at {}: {e}", self.path.display());
            return false;
        }
        existed
    }

    fn read(&self) -> Option<Session> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Malformed session file {}: {e}", self.path.display());
                None
            }
        }
    }

    fn try_save(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        };
        let contents =
            serde_json::to_string_pretty(&session).context("Failed to serialize session")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}
