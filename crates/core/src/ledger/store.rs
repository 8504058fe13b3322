//! Persistence for the token ledger.
//!
//! The ledger is a single JSON document. [`JsonFileLedgerStore`] keeps it
//! on disk; [`MemoryLedgerStore`] keeps it in process for tests and
//! ephemeral sessions.
//!
//! Writes are read-modify-write and not coordinated across processes: two
//! processes sharing one file can lose each other's updates.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{LedgerError, LedgerState};

/// Load/save access to the persisted ledger document.
pub trait LedgerStore: Send + Sync {
    /// Return the stored state, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<LedgerState>, LedgerError>;

    /// Replace the stored state.
    fn save(&self, state: &LedgerState) -> Result<(), LedgerError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: Mutex<Option<LedgerState>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing state.
    pub fn with_state(state: LedgerState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<Option<LedgerState>, LedgerError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &LedgerState) -> Result<(), LedgerError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".into()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}

/// JSON document on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable document is moved: `<path>.corrupt`.
    pub fn quarantine_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }
}

impl LedgerStore for JsonFileLedgerStore {
    fn load(&self) -> Result<Option<LedgerState>, LedgerError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::Storage(e.to_string())),
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                // Moved aside before it can be overwritten by the next save.
                let quarantine = self.quarantine_path();
                std::fs::rename(&self.path, &quarantine)
                    .map_err(|e| LedgerError::Storage(e.to_string()))?;
                tracing::warn!(
                    path = %self.path.display(),
                    moved_to = %quarantine.display(),
                    error = %e,
                    "Unreadable ledger file moved aside, starting empty",
                );
                Ok(None)
            }
        }
    }

    fn save(&self, state: &LedgerState) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LedgerError::Storage(e.to_string()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| LedgerError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| LedgerError::Storage(e.to_string()))
    }
}
