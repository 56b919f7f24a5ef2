//! Session management — persists the user token to disk.
//!
//! The session file is stored at `~/.config/musixmatch/session.json` and contains:
//!
//! ```json
//! { "user_token": "2203269256ff7abc...", "context": "desktop" }
//! ```
//!
//! A user token is issued by `token.get` (see
//! [`MusixmatchClient::issue_token`](crate::MusixmatchClient::issue_token))
//! and only works with the context it was issued for. The environment
//! variable [`TOKEN_ENV`] overrides the stored token.

use crate::context::ApiContext;
use crate::error::{MusixmatchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable that overrides the stored user token.
pub const TOKEN_ENV: &str = "MUSIXMATCH_TOKEN";

/// Persistent login session backed by a JSON file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Session {
    /// The user token.
    pub user_token: Option<String>,
    /// Context the token was issued for.
    #[serde(default)]
    pub context: ApiContext,
}

impl Session {
    /// Load session from `~/.config/musixmatch/session.json`.
    ///
    /// Returns a default (empty) session if the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            debug!(path = %path.display(), "no session file");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Load the session, then apply [`TOKEN_ENV`] if it is set and non-empty.
    pub fn load_with_env() -> Result<Self> {
        Ok(Self::load()?.with_token_override(std::env::var(TOKEN_ENV).ok()))
    }

    /// Replace the token with `token` when it is `Some` and non-empty.
    #[must_use]
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.user_token = Some(token);
        }
        self
    }

    /// Save session to disk, creating parent directories if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&path, data)?;
        Ok(())
    }

    /// Delete the session file from disk.
    pub fn clear() -> Result<()> {
        let path = Self::path()?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Check whether a token is present (does not validate it).
    pub fn is_logged_in(&self) -> bool {
        self.user_token.as_ref().is_some_and(|t| !t.is_empty())
    }

    fn path() -> Result<PathBuf> {
        let config = dirs::config_dir()
            .ok_or_else(|| MusixmatchError::Other("cannot determine config directory".into()))?;
        Ok(config.join("musixmatch").join("session.json"))
    }
}
