//! Cursor-state persistence between sync runs.
//!
//! One JSON file holds the cursor snapshots of every incremental stream:
//! `{ "price_history": { "TCB": "2024-01-02" }, "intraday": { "VVS": 417 } }`.
//! Writes are atomic (write to .tmp, rename into place) so an interrupted
//! save never corrupts the previous state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use vnfeed_core::cursor::CursorState;

/// Errors from loading or saving persisted state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O: {0}")]
    Io(String),

    #[error("state file format: {0}")]
    Format(String),
}

/// On-disk shape: stream name → (ticker → marker).
pub type PersistedState = BTreeMap<String, CursorState>;

/// File-backed store for cursor state.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole state map. A missing file is an empty state.
    pub fn load(&self) -> Result<PersistedState, StateError> {
        if !self.path.exists() {
            return Ok(PersistedState::new());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| StateError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| StateError::Format(e.to_string()))
    }

    /// The persisted cursor for one stream, if any.
    pub fn cursor_for(&self, stream: &str) -> Result<Option<CursorState>, StateError> {
        Ok(self.load()?.remove(stream))
    }

    /// Merge one stream's snapshot into the file, atomically.
    pub fn save_cursor(&self, stream: &str, cursor: &CursorState) -> Result<(), StateError> {
        let mut state = self.load()?;
        state.insert(stream.to_string(), cursor.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StateError::Io(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| StateError::Format(e.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| StateError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StateError::Io(format!("atomic rename failed: {e}"))
        })?;

        debug!(stream, path = %self.path.display(), "cursor state saved");
        Ok(())
    }

    /// Delete the state file. Removing a file that does not exist is fine.
    pub fn clear(&self) -> Result<(), StateError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::Io(e.to_string())),
        }
    }
}
