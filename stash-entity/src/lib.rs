//! Entity layer for stash.
//!
//! Turns an [`EntityDefinition`](stash_model::EntityDefinition) into a live
//! collection: validated, timestamped CRUD over a table backend, with every
//! successful write republishing an observable snapshot of the table.
//!
//! # Architecture
//!
//! - [`CrudOps`] wraps one table with structured logging, no rules
//! - [`Entity`] adds payload cleanup, timestamps, validation and the
//!   [`ReactiveCache`] resync after each write
//! - [`EntityRegistry`] constructs and loads one [`Entity`] per [`EntityKind`]
//!   on demand
//! - [`StashConfig`] selects the table backend
//!
//! # Example
//!
//! ```
//! use stash_entity::{EntityKind, EntityRegistry};
//! use stash_model::{EntityDefinition, FieldDefinition, SchemaError, rules};
//! use stash_storage::MemoryBackend;
//! use stash_types::Fields;
//! use std::sync::Arc;
//!
//! struct Guitars;
//!
//! impl EntityKind for Guitars {
//!     const NAME: &'static str = "guitars";
//!
//!     fn definition() -> Result<EntityDefinition, SchemaError> {
//!         EntityDefinition::builder(Self::NAME, "Guitar")
//!             .field(
//!                 "name",
//!                 FieldDefinition::string()
//!                     .indexed()
//!                     .required()
//!                     .validate(rules::non_empty_string("Name")),
//!             )
//!             .build()
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), stash_entity::EntityError> {
//! let registry = EntityRegistry::new(Arc::new(MemoryBackend::new()));
//! let guitars = registry.entity::<Guitars>().await?;
//!
//! let id = guitars.add(Fields::new().with("name", "  Les Paul  ")).await?;
//! let records = guitars.records();
//! assert_eq!(records[0].id, id);
//! assert_eq!(records[0].get_str("name"), Some("Les Paul"));
//!
//! let err = guitars.add(Fields::new().with("name", "")).await.unwrap_err();
//! assert_eq!(err.to_string(), "Guitar validation failed: Name must be a non-empty string");
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;
mod entity;
mod error;
mod ops;
mod registry;

pub use cache::{ReactiveCache, Snapshot, SnapshotReceiver};
pub use config::{StashConfig, StorageConfig};
pub use entity::Entity;
pub use error::{EntityError, EntityResult};
pub use ops::{BulkUpdate, CrudOps};
pub use registry::{EntityKind, EntityRegistry};
