//! Process-local table store.
//!
//! Rows live in a `BTreeMap` behind a `tokio` read/write lock. A write lock is
//! held for the whole of every bulk call, which gives the same all-or-nothing
//! behaviour as a database transaction.

use crate::error::{StorageError, StorageResult};
use crate::table::{Table, TableProvider, check_explicit_id, sort_newest_first};
use async_trait::async_trait;
use stash_model::StorageIndexSpec;
use stash_types::{Fields, ID, Record, RecordId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug)]
struct TableState {
    /// Next id to hand out; `None` once `i64::MAX` has been used.
    next_id: Option<i64>,
    rows: BTreeMap<RecordId, Fields>,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            next_id: Some(1),
            rows: BTreeMap::new(),
        }
    }
}

impl TableState {
    fn allocate(&mut self, table: &str) -> StorageResult<RecordId> {
        let id = self.next_id.ok_or_else(|| {
            StorageError::InvalidData(format!("{table}: record id space exhausted"))
        })?;
        self.next_id = id.checked_add(1);
        Ok(RecordId::new(id))
    }

    fn insert(&mut self, id: RecordId, mut fields: Fields) {
        fields.remove(ID);
        self.rows.insert(id, fields);
    }

    fn put(&mut self, record: Record) {
        // Explicit ids never get handed out again by the counter.
        self.next_id = match (self.next_id, record.id.get().checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        self.insert(record.id, record.fields);
    }

    fn record(&self, id: RecordId) -> Option<Record> {
        self.rows.get(&id).map(|fields| Record::new(id, fields.clone()))
    }
}

/// An in-memory [`Table`].
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    spec: StorageIndexSpec,
    state: RwLock<TableState>,
}

impl MemoryTable {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>, spec: StorageIndexSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            state: RwLock::new(TableState::default()),
        }
    }

    /// Number of rows currently stored.
    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Table for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self) -> &StorageIndexSpec {
        &self.spec
    }

    async fn add(&self, fields: Fields) -> StorageResult<RecordId> {
        let mut state = self.state.write().await;
        let id = state.allocate(&self.name)?;
        state.insert(id, fields);
        Ok(id)
    }

    async fn update(&self, id: RecordId, mut changes: Fields) -> StorageResult<()> {
        let mut state = self.state.write().await;
        let row = state.rows.get_mut(&id).ok_or_else(|| StorageError::NotFound {
            table: self.name.clone(),
            id,
        })?;
        changes.remove(ID);
        row.merge(changes);
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> StorageResult<()> {
        self.state.write().await.rows.remove(&id);
        Ok(())
    }

    async fn get(&self, id: RecordId) -> StorageResult<Option<Record>> {
        Ok(self.state.read().await.record(id))
    }

    async fn bulk_get(&self, ids: &[RecordId]) -> StorageResult<Vec<Option<Record>>> {
        let state = self.state.read().await;
        Ok(ids.iter().map(|id| state.record(*id)).collect())
    }

    async fn bulk_add(&self, rows: Vec<Fields>) -> StorageResult<Vec<RecordId>> {
        let mut state = self.state.write().await;
        let start = state.next_id;
        let ids = match (0..rows.len())
            .map(|_| state.allocate(&self.name))
            .collect::<StorageResult<Vec<_>>>()
        {
            Ok(ids) => ids,
            Err(err) => {
                state.next_id = start;
                return Err(err);
            }
        };
        for (id, fields) in ids.iter().zip(rows) {
            state.insert(*id, fields);
        }
        Ok(ids)
    }

    async fn bulk_put(&self, rows: Vec<Record>) -> StorageResult<()> {
        for record in &rows {
            check_explicit_id(record.id)?;
        }
        let mut state = self.state.write().await;
        for record in rows {
            state.put(record);
        }
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[RecordId]) -> StorageResult<()> {
        let mut state = self.state.write().await;
        for id in ids {
            state.rows.remove(id);
        }
        Ok(())
    }

    async fn ordered_desc(&self, field: &str) -> StorageResult<Vec<Record>> {
        let mut records: Vec<Record> = {
            let state = self.state.read().await;
            state
                .rows
                .iter()
                .map(|(id, fields)| Record::new(*id, fields.clone()))
                .collect()
        };
        sort_newest_first(&mut records, field);
        Ok(records)
    }
}

/// Backend handing out shared [`MemoryTable`]s by name.
///
/// Opening the same name twice returns the same table, so every handle sees
/// the same rows for the lifetime of the backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Arc<MemoryTable>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the concrete table if it has been opened.
    pub fn table(&self, name: &str) -> Option<Arc<MemoryTable>> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

#[async_trait]
impl TableProvider for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn open_table(&self, name: &str, spec: &StorageIndexSpec) -> StorageResult<Arc<dyn Table>> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table: Arc<dyn Table> = tables
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(table = name, indexes = %spec, "Creating in-memory table");
                Arc::new(MemoryTable::new(name, spec.clone()))
            })
            .clone();
        Ok(table)
    }
}
