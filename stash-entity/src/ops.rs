//! Generic CRUD over one table.
//!
//! [`CrudOps`] is bound to a single [`Table`] and adds structured logging
//! around every call. It applies no validation and no timestamping; that is
//! the entity layer's job. Every failure is logged and then returned to the
//! caller untouched.

use crate::error::{EntityError, EntityResult};
use stash_storage::Table;
use stash_types::{CREATED_AT, Fields, Record, RecordId};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// One item of a bulk update: the target id and the fields to overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkUpdate {
    pub id: RecordId,
    pub changes: Fields,
}

impl BulkUpdate {
    pub fn new(id: RecordId, changes: Fields) -> Self {
        Self { id, changes }
    }
}

/// Logged CRUD operations for one table.
pub struct CrudOps {
    module: String,
    table: Arc<dyn Table>,
}

impl fmt::Debug for CrudOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudOps")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl CrudOps {
    /// Binds operations to `table`. Log lines carry the table name.
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self {
            module: table.name().to_string(),
            table,
        }
    }

    /// The name used in log lines and errors.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn table(&self) -> &Arc<dyn Table> {
        &self.table
    }

    fn failed(&self, op: &'static str, input: &dyn fmt::Debug, err: impl Into<EntityError>) -> EntityError {
        let err = err.into();
        error!(module = %self.module, op, input = ?input, error = %err, "Operation failed");
        err
    }

    /// Every record, newest `created_at` first.
    pub async fn load(&self) -> EntityResult<Vec<Record>> {
        debug!(module = %self.module, "Loading records");
        let records = self
            .table
            .ordered_desc(CREATED_AT)
            .await
            .map_err(|e| self.failed("load", &CREATED_AT, e))?;
        debug!(module = %self.module, count = records.len(), "Loaded records");
        Ok(records)
    }

    /// Inserts one record and returns its new id.
    pub async fn add(&self, fields: Fields) -> EntityResult<RecordId> {
        debug!(module = %self.module, fields = ?fields, "Adding record");
        let id = self
            .table
            .add(fields.clone())
            .await
            .map_err(|e| self.failed("add", &fields, e))?;
        info!(module = %self.module, %id, field_count = fields.len(), "Added record");
        Ok(id)
    }

    /// Merges `changes` into the record with `id`.
    pub async fn update(&self, id: RecordId, changes: Fields) -> EntityResult<()> {
        debug!(module = %self.module, %id, changes = ?changes, "Updating record");
        let fields: Vec<String> = changes.names().map(str::to_string).collect();
        self.table
            .update(id, changes.clone())
            .await
            .map_err(|e| self.failed("update", &(id, &changes), e))?;
        info!(module = %self.module, %id, ?fields, "Updated record");
        Ok(())
    }

    /// Removes the record with `id`. Deleting a missing id succeeds.
    pub async fn delete(&self, id: RecordId) -> EntityResult<()> {
        debug!(module = %self.module, %id, "Deleting record");
        self.table
            .delete(id)
            .await
            .map_err(|e| self.failed("delete", &id, e))?;
        info!(module = %self.module, %id, "Deleted record");
        Ok(())
    }

    /// Inserts every row in one transaction. Ids follow input order.
    pub async fn bulk_add(&self, rows: Vec<Fields>) -> EntityResult<Vec<RecordId>> {
        debug!(module = %self.module, count = rows.len(), "Bulk adding records");
        let count = rows.len();
        let ids = self
            .table
            .bulk_add(rows.clone())
            .await
            .map_err(|e| self.failed("bulk_add", &rows, e))?;
        info!(module = %self.module, count, ids = ?ids, "Bulk added records");
        Ok(ids)
    }

    /// Overlays each item's changes onto its current row and writes all rows
    /// back in one transaction.
    ///
    /// If any id is missing, nothing is written and [`EntityError::NotFound`]
    /// lists every missing id. When an id appears more than once, each item
    /// merges against the same fetched row and the last one written wins.
    pub async fn bulk_update(&self, updates: Vec<BulkUpdate>) -> EntityResult<()> {
        debug!(module = %self.module, count = updates.len(), "Bulk updating records");
        let ids: Vec<RecordId> = updates.iter().map(|u| u.id).collect();
        let current = self
            .table
            .bulk_get(&ids)
            .await
            .map_err(|e| self.failed("bulk_update", &updates, e))?;

        let missing: Vec<RecordId> = ids
            .iter()
            .zip(&current)
            .filter(|(_, row)| row.is_none())
            .map(|(id, _)| *id)
            .collect();
        if !missing.is_empty() {
            return Err(self.failed(
                "bulk_update",
                &updates,
                EntityError::NotFound {
                    entity: self.module.clone(),
                    ids: missing,
                },
            ));
        }

        let merged: Vec<Record> = current
            .into_iter()
            .flatten()
            .zip(&updates)
            .map(|(row, update)| row.merged(&update.changes))
            .collect();
        self.table
            .bulk_put(merged)
            .await
            .map_err(|e| self.failed("bulk_update", &updates, e))?;
        info!(module = %self.module, ids = ?ids, "Bulk updated records");
        Ok(())
    }

    /// Removes every listed id in one transaction. Missing ids are ignored.
    pub async fn bulk_delete(&self, ids: &[RecordId]) -> EntityResult<()> {
        debug!(module = %self.module, count = ids.len(), "Bulk deleting records");
        self.table
            .bulk_delete(ids)
            .await
            .map_err(|e| self.failed("bulk_delete", &ids, e))?;
        info!(module = %self.module, ids = ?ids, "Bulk deleted records");
        Ok(())
    }
}
