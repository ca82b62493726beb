//! The storage engine boundary.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use stash_model::StorageIndexSpec;
use stash_types::{Fields, Record, RecordId, Value};
use std::sync::Arc;

/// One indexed table addressable by auto-increment ids.
///
/// Each bulk call is a single transaction: it either applies completely or
/// not at all.
#[async_trait]
pub trait Table: Send + Sync {
    /// Table name.
    fn name(&self) -> &str;

    /// Index declarations this table was opened with.
    fn spec(&self) -> &StorageIndexSpec;

    /// Inserts one row and returns its new id. Any `id` key is ignored.
    async fn add(&self, fields: Fields) -> StorageResult<RecordId>;

    /// Overlays `changes` onto an existing row. Fails with `NotFound` when
    /// no row has `id`.
    async fn update(&self, id: RecordId, changes: Fields) -> StorageResult<()>;

    /// Removes a row. Deleting a missing id is not an error.
    async fn delete(&self, id: RecordId) -> StorageResult<()>;

    async fn get(&self, id: RecordId) -> StorageResult<Option<Record>>;

    /// Fetches rows positionally; missing ids yield `None`.
    async fn bulk_get(&self, ids: &[RecordId]) -> StorageResult<Vec<Option<Record>>>;

    /// Inserts rows in one transaction and returns their ids in input order.
    async fn bulk_add(&self, rows: Vec<Fields>) -> StorageResult<Vec<RecordId>>;

    /// Writes full rows (insert or replace by id) in one transaction.
    async fn bulk_put(&self, rows: Vec<Record>) -> StorageResult<()>;

    /// Removes rows in one transaction.
    async fn bulk_delete(&self, ids: &[RecordId]) -> StorageResult<()>;

    /// Every row ordered by `field` descending, ties broken by id descending.
    async fn ordered_desc(&self, field: &str) -> StorageResult<Vec<Record>>;
}

/// Opens tables on a storage backend.
#[async_trait]
pub trait TableProvider: Send + Sync {
    /// Short backend name for diagnostics.
    fn kind(&self) -> &'static str;

    /// Opens (creating if needed) the table `name` with the given indexes.
    async fn open_table(&self, name: &str, spec: &StorageIndexSpec) -> StorageResult<Arc<dyn Table>>;
}

/// Rejects explicit ids the store could never have assigned.
pub(crate) fn check_explicit_id(id: RecordId) -> StorageResult<()> {
    if id.get() > 0 {
        Ok(())
    } else {
        Err(StorageError::InvalidData(format!("record id must be positive, got {id}")))
    }
}

/// Sorts rows newest-first by `field`, absent values last, then by id.
pub fn sort_newest_first(records: &mut [Record], field: &str) {
    records.sort_by(|a, b| {
        Value::cmp_optional(b.get(field), a.get(field)).then_with(|| b.id.cmp(&a.id))
    });
}
