//! Runtime configuration.
//!
//! ```json
//! { "storage": { "kind": "sqlite", "path": "stash.db", "busy_timeout_ms": 5000 } }
//! ```
//!
//! Every section is optional; an empty document selects in-memory storage.

use crate::error::{EntityError, EntityResult};
use serde::{Deserialize, Serialize};
use stash_storage::{DEFAULT_BUSY_TIMEOUT, MemoryBackend, SqliteBackend, TableProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// Where entity tables live.
    pub storage: StorageConfig,
}

/// Table backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Process memory; contents are lost on exit.
    Memory,
    /// A SQLite database file.
    Sqlite {
        path: PathBuf,
        /// How long a writer waits on a locked database file.
        #[serde(default = "default_busy_timeout_ms")]
        busy_timeout_ms: u64,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memory
    }
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT.as_millis() as u64
}

impl StashConfig {
    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> EntityResult<Self> {
        serde_json::from_str(json).map_err(|e| EntityError::Config(e.to_string()))
    }

    /// Reads and parses a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> EntityResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| EntityError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Opens the configured backend.
    pub fn open_backend(&self) -> EntityResult<Arc<dyn TableProvider>> {
        let backend: Arc<dyn TableProvider> = match &self.storage {
            StorageConfig::Memory => Arc::new(MemoryBackend::new()),
            StorageConfig::Sqlite {
                path,
                busy_timeout_ms,
            } => Arc::new(SqliteBackend::open_with_timeout(
                path,
                Duration::from_millis(*busy_timeout_ms),
            )?),
        };
        info!(backend = backend.kind(), "Opened table backend");
        Ok(backend)
    }
}
