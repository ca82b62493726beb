//! Core type definitions for the stash entity engine.
//!
//! This crate defines the fundamental, entity-agnostic types used throughout
//! the engine:
//! - [`Value`] is the closed set of primitive field values
//! - [`RecordId`] is the store-assigned surrogate key
//! - [`Fields`] and [`Record`] are payloads and persisted rows
//! - [`Clock`] is the monotonic time source used for `created_at`/`updated_at`
//!
//! Entity-specific shapes (guitars, goals, practice sessions, ...) are
//! described at runtime by `stash-model` definitions, not here.

mod clock;
mod ids;
mod record;
mod value;

pub use clock::{Clock, SystemClock};
pub use ids::RecordId;
pub use record::{CREATED_AT, Fields, ID, Record, UPDATED_AT, is_base_field};
pub use value::{Value, ValueKind};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),
}
