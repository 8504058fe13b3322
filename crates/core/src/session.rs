//! Locally persisted auth session.
//!
//! The session record is a small JSON file written by whatever performed
//! the login. Clients only read it: the access token is attached as a
//! bearer credential while it is unexpired.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The bearer token, or `None` once the session has expired.
    pub fn bearer(&self, now: DateTime<Utc>) -> Option<&str> {
        (!self.is_expired(now)).then_some(self.access_token.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to read session file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid session file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Session record stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the session, `None` when no file exists.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SessionError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// The current bearer token, if a session exists and is unexpired.
    pub fn bearer_token(&self, now: DateTime<Utc>) -> Result<Option<String>, SessionError> {
        Ok(self
            .load()?
            .and_then(|s| s.bearer(now).map(String::from)))
    }
}
