//! Entity rules layer.
//!
//! An [`Entity`] wraps [`CrudOps`] for one definition. Before any write it
//! drops engine-owned keys, stamps timestamps from its [`Clock`], trims string
//! fields and rejects invalid payloads. After every successful write it
//! reloads the table and republishes the [`ReactiveCache`]. A failed write
//! leaves the cache as it was.

use crate::cache::{ReactiveCache, Snapshot, SnapshotReceiver};
use crate::error::{EntityError, EntityResult};
use crate::ops::{BulkUpdate, CrudOps};
use chrono::{DateTime, Utc};
use stash_model::{EntityDefinition, ValidationSchema, validate_or_reject};
use stash_storage::{Table, TableProvider};
use stash_types::{CREATED_AT, Clock, Fields, ID, Record, RecordId, UPDATED_AT, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A typed collection of records with validation and an observable cache.
pub struct Entity {
    definition: EntityDefinition,
    validation: ValidationSchema,
    string_fields: Vec<String>,
    ops: CrudOps,
    cache: ReactiveCache,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.definition.name())
            .field("generation", &self.cache.generation())
            .finish_non_exhaustive()
    }
}

impl Entity {
    /// Binds `definition` to an already opened table.
    pub fn new(definition: EntityDefinition, table: Arc<dyn Table>, clock: Arc<dyn Clock>) -> Self {
        let validation = definition.validation_schema();
        let string_fields = definition.fields().string_fields();
        info!(
            entity = definition.name(),
            indexes = %table.spec(),
            rules = validation.len(),
            "Entity ready"
        );
        Self {
            definition,
            validation,
            string_fields,
            ops: CrudOps::new(table),
            cache: ReactiveCache::new(),
            clock,
        }
    }

    /// Opens the definition's table on `backend` and binds to it.
    ///
    /// Storage is not read; the cache stays empty until [`Entity::load`].
    pub async fn open(
        definition: EntityDefinition,
        backend: &dyn TableProvider,
        clock: Arc<dyn Clock>,
    ) -> EntityResult<Self> {
        let table = backend
            .open_table(definition.name(), &definition.storage_schema())
            .await?;
        Ok(Self::new(definition, table, clock))
    }

    pub fn definition(&self) -> &EntityDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn cache(&self) -> &ReactiveCache {
        &self.cache
    }

    /// Subscribes to cache publications.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.cache.subscribe()
    }

    /// The most recently published records, newest first.
    pub fn records(&self) -> Snapshot {
        self.cache.snapshot()
    }

    /// Reads every record from storage and publishes them.
    pub async fn load(&self) -> EntityResult<Vec<Record>> {
        let records = self.ops.load().await?;
        self.publish(records.clone());
        Ok(records)
    }

    /// Validates and stores a new record. `created_at` and `updated_at` are
    /// set to the same instant.
    ///
    /// [`EntityError::ResyncFailed`] carries the new id when the row was
    /// stored but the reload after it failed; retrying would duplicate it.
    pub async fn add(&self, payload: Fields) -> EntityResult<RecordId> {
        let fields = self.prepare_create(payload, self.clock.now())?;
        let id = self.ops.add(fields).await?;
        self.resync(&[id]).await?;
        Ok(id)
    }

    /// Validates and applies a partial update.
    ///
    /// Only the rules of fields present in `changes` run, together with the
    /// `updated_at` rule. Fields left out keep their stored values.
    pub async fn update(&self, id: RecordId, changes: Fields) -> EntityResult<()> {
        let changes = self.prepare_update(changes)?;
        self.ops.update(id, changes).await?;
        self.resync(&[id]).await
    }

    /// Removes a record. Deleting a missing id still republishes.
    pub async fn delete(&self, id: RecordId) -> EntityResult<()> {
        self.ops.delete(id).await?;
        self.resync(&[id]).await
    }

    /// Validates every payload, then stores them in one transaction.
    ///
    /// Each item gets its own timestamp. The first invalid item rejects the
    /// whole batch before anything is written. A failed reload after the
    /// write is reported as [`EntityError::ResyncFailed`] with the new ids.
    pub async fn bulk_add(&self, payloads: Vec<Fields>) -> EntityResult<Vec<RecordId>> {
        let rows = payloads
            .into_iter()
            .map(|payload| self.prepare_create(payload, self.clock.now()))
            .collect::<EntityResult<Vec<_>>>()?;
        let ids = self.ops.bulk_add(rows).await?;
        self.resync(&ids).await?;
        Ok(ids)
    }

    /// Validates every item's changes, then applies them atomically.
    pub async fn bulk_update(&self, updates: Vec<BulkUpdate>) -> EntityResult<()> {
        let updates = updates
            .into_iter()
            .map(|update| -> EntityResult<BulkUpdate> {
                Ok(BulkUpdate::new(update.id, self.prepare_update(update.changes)?))
            })
            .collect::<EntityResult<Vec<_>>>()?;
        let ids: Vec<RecordId> = updates.iter().map(|u| u.id).collect();
        self.ops.bulk_update(updates).await?;
        self.resync(&ids).await
    }

    /// Removes every listed id in one transaction.
    pub async fn bulk_delete(&self, ids: &[RecordId]) -> EntityResult<()> {
        self.ops.bulk_delete(ids).await?;
        self.resync(ids).await
    }

    fn prepare_create(&self, mut payload: Fields, now: DateTime<Utc>) -> EntityResult<Fields> {
        payload.retain(|name, _| name != ID);
        payload.insert(CREATED_AT, now);
        payload.insert(UPDATED_AT, now);
        self.trim_strings(&mut payload);
        self.check(&payload, &self.validation, self.definition.label())?;
        Ok(payload)
    }

    fn prepare_update(&self, mut changes: Fields) -> EntityResult<Fields> {
        changes.retain(|name, _| name != ID && name != CREATED_AT);
        changes.insert(UPDATED_AT, self.clock.now());
        self.trim_strings(&mut changes);
        let schema = self.validation.restricted_to(|name| changes.contains(name));
        let label = format!("{} update", self.definition.label());
        self.check(&changes, &schema, &label)?;
        Ok(changes)
    }

    fn trim_strings(&self, fields: &mut Fields) {
        for name in &self.string_fields {
            if let Some(Value::String(s)) = fields.get_mut(name) {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    *s = trimmed.to_string();
                }
            }
        }
    }

    fn check(&self, fields: &Fields, schema: &ValidationSchema, label: &str) -> EntityResult<()> {
        validate_or_reject(fields, schema, label).map_err(|err| {
            warn!(entity = self.name(), violations = ?err.violations, "Rejected invalid payload");
            EntityError::from(err)
        })
    }

    /// Reloads and republishes after a write to `ids` has been stored.
    async fn resync(&self, ids: &[RecordId]) -> EntityResult<()> {
        let records = self.ops.load().await.map_err(|err| EntityError::ResyncFailed {
            entity: self.name().to_string(),
            ids: ids.to_vec(),
            source: Box::new(err),
        })?;
        self.publish(records);
        Ok(())
    }

    fn publish(&self, records: Vec<Record>) {
        let count = records.len();
        let generation = self.cache.publish(records);
        debug!(entity = self.name(), count, generation, "Published records");
    }
}
