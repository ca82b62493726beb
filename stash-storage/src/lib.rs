//! Table storage layer for stash.
//!
//! Defines the storage engine boundary the entity layer talks to and ships
//! two engines behind it.
//!
//! # Architecture
//!
//! - [`Table`] is one indexed table addressable by auto-increment ids, with
//!   single-row and transactional bulk writes plus a descending range scan
//! - [`TableProvider`] opens tables from a compiled `StorageIndexSpec`
//! - [`MemoryBackend`] keeps rows in process memory
//! - [`SqliteBackend`] persists rows as JSON documents in SQLite, with one
//!   indexed column per indexed field

mod error;
mod memory;
mod sqlite;
mod table;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryBackend, MemoryTable};
pub use sqlite::{DEFAULT_BUSY_TIMEOUT, SqliteBackend, SqliteTable};
pub use table::{Table, TableProvider, sort_newest_first};
