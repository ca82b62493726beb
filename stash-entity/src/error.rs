//! Error types for the entity layer.

use stash_model::{SchemaError, ValidationError};
use stash_storage::StorageError;
use stash_types::RecordId;
use thiserror::Error;

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Errors surfaced by entity operations.
///
/// Nothing here is recovered locally: errors are logged where they occur and
/// handed to the caller unchanged.
#[derive(Debug, Error)]
pub enum EntityError {
    /// The entity definition is malformed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The payload broke one or more field rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A bulk update named ids that do not exist; nothing was written.
    #[error("{entity}: records not found: {ids:?}")]
    NotFound { entity: String, ids: Vec<RecordId> },

    /// The table store reported a failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The write to `ids` was stored, but reloading the table afterwards
    /// failed. The cache still holds the snapshot from before the write.
    #[error("{entity}: write to {ids:?} was stored but reloading failed: {source}")]
    ResyncFailed {
        entity: String,
        ids: Vec<RecordId>,
        #[source]
        source: Box<EntityError>,
    },

    #[error("entity registry has not been installed")]
    RegistryNotInstalled,

    #[error("entity registry is already installed")]
    RegistryAlreadyInstalled,

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl EntityError {
    /// The aggregated violations, if this is a validation failure.
    pub fn violations(&self) -> Option<&[String]> {
        match self {
            Self::Validation(err) => Some(&err.violations),
            _ => None,
        }
    }

    /// True when the write itself reached storage and must not be retried.
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::ResyncFailed { .. })
    }
}
