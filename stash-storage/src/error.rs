//! Error types for the storage layer.

use stash_types::RecordId;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row body could not be encoded or decoded.
    #[error("record encoding error: {0}")]
    Encoding(#[from] stash_types::Error),

    /// No row with this id.
    #[error("record not found: {table}#{id}")]
    NotFound { table: String, id: RecordId },

    /// A connection lock was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    LockPoisoned(String),

    /// Blocking database task failed to complete.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A write the store cannot accept, such as a non-positive explicit id.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
