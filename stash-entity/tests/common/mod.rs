#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use stash_entity::{Entity, EntityKind};
use stash_model::{EntityDefinition, FieldDefinition, SchemaError, rules};
use stash_storage::{MemoryBackend, StorageError, StorageResult, Table, TableProvider};
use stash_model::StorageIndexSpec;
use stash_types::{Clock, Fields, Record, RecordId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Routes log output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct Guitars;

impl EntityKind for Guitars {
    const NAME: &'static str = "guitars";

    fn definition() -> Result<EntityDefinition, SchemaError> {
        EntityDefinition::builder(Self::NAME, "Guitar")
            .field(
                "name",
                FieldDefinition::string()
                    .indexed()
                    .required()
                    .validate(rules::non_empty_string("Name")),
            )
            .field(
                "description",
                FieldDefinition::string().validate(rules::string("Description")),
            )
            .build()
    }
}

pub struct Contacts;

impl EntityKind for Contacts {
    const NAME: &'static str = "contacts";

    fn definition() -> Result<EntityDefinition, SchemaError> {
        EntityDefinition::builder(Self::NAME, "Contact")
            .field(
                "email",
                FieldDefinition::string()
                    .indexed()
                    .required()
                    .validate(rules::required("Email").and(rules::email("Email"))),
            )
            .field("age", FieldDefinition::number().validate(rules::number("Age")))
            .field("active", FieldDefinition::boolean().validate(rules::boolean("Active")))
            .build()
    }
}

/// Declares a field literally called `id`, which the builder refuses.
pub struct Broken;

impl EntityKind for Broken {
    const NAME: &'static str = "broken";

    fn definition() -> Result<EntityDefinition, SchemaError> {
        EntityDefinition::builder(Self::NAME, "Broken")
            .field("id", FieldDefinition::string())
            .build()
    }
}

pub fn guitar(name: &str) -> Fields {
    Fields::new().with("name", name)
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Clock that advances one second per reading.
#[derive(Debug)]
pub struct StepClock {
    next: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + Duration::seconds(1);
        now
    }
}

pub fn step_clock() -> Arc<StepClock> {
    Arc::new(StepClock::starting_at(t0()))
}

/// Guitars entity over a fresh in-memory table with a stepping clock.
pub async fn guitars_entity() -> Entity {
    init_tracing();
    Entity::open(Guitars::definition().unwrap(), &MemoryBackend::new(), step_clock())
        .await
        .unwrap()
}

/// A table that forwards to an inner table until told to fail writes.
pub struct FlakyTable {
    inner: Arc<dyn Table>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FlakyTable {
    pub fn wrap(inner: Arc<dyn Table>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        })
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::InvalidData("disk full".into()))
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StorageError::InvalidData("read failed".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Table for FlakyTable {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn spec(&self) -> &StorageIndexSpec {
        self.inner.spec()
    }

    async fn add(&self, fields: Fields) -> StorageResult<RecordId> {
        self.check_write()?;
        self.inner.add(fields).await
    }

    async fn update(&self, id: RecordId, changes: Fields) -> StorageResult<()> {
        self.check_write()?;
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: RecordId) -> StorageResult<()> {
        self.check_write()?;
        self.inner.delete(id).await
    }

    async fn get(&self, id: RecordId) -> StorageResult<Option<Record>> {
        self.check_read()?;
        self.inner.get(id).await
    }

    async fn bulk_get(&self, ids: &[RecordId]) -> StorageResult<Vec<Option<Record>>> {
        self.check_read()?;
        self.inner.bulk_get(ids).await
    }

    async fn bulk_add(&self, rows: Vec<Fields>) -> StorageResult<Vec<RecordId>> {
        self.check_write()?;
        self.inner.bulk_add(rows).await
    }

    async fn bulk_put(&self, rows: Vec<Record>) -> StorageResult<()> {
        self.check_write()?;
        self.inner.bulk_put(rows).await
    }

    async fn bulk_delete(&self, ids: &[RecordId]) -> StorageResult<()> {
        self.check_write()?;
        self.inner.bulk_delete(ids).await
    }

    async fn ordered_desc(&self, field: &str) -> StorageResult<Vec<Record>> {
        self.check_read()?;
        self.inner.ordered_desc(field).await
    }
}

/// Guitars entity over a [`FlakyTable`], plus a handle to the table.
pub async fn flaky_guitars() -> (Entity, Arc<FlakyTable>) {
    init_tracing();
    let definition = Guitars::definition().unwrap();
    let inner = MemoryBackend::new()
        .open_table(definition.name(), &definition.storage_schema())
        .await
        .unwrap();
    let table = FlakyTable::wrap(inner);
    let entity = Entity::new(definition, table.clone(), step_clock());
    (entity, table)
}
