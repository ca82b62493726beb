//! SQLite table store.
//!
//! Each entity type gets one SQL table: an `AUTOINCREMENT` integer key, the
//! row body as a JSON document, and one sortable column per indexed field
//! with a matching `CREATE INDEX`. All tables of a backend share a single
//! connection; blocking work runs on the tokio blocking pool.

use crate::error::{StorageError, StorageResult};
use crate::table::{Table, TableProvider, check_explicit_id, sort_newest_first};
use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use stash_model::StorageIndexSpec;
use stash_types::{Fields, ID, Record, RecordId, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Default time a writer waits on a locked database file.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed table provider.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens a database file with an explicit busy timeout.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> StorageResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        info!(path = %path.display(), "Opened SQLite table store");
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl TableProvider for SqliteBackend {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn open_table(&self, name: &str, spec: &StorageIndexSpec) -> StorageResult<Arc<dyn Table>> {
        let layout = Arc::new(TableLayout::new(name, spec));
        let conn = Arc::clone(&self.conn);
        let ddl = Arc::clone(&layout);
        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            lock(&conn)?.execute_batch(&ddl.create_sql())?;
            Ok(())
        })
        .await??;
        debug!(table = name, indexes = %spec, "Opened SQLite table");
        Ok(Arc::new(SqliteTable {
            conn: Arc::clone(&self.conn),
            spec: spec.clone(),
            layout,
        }))
    }
}

fn lock(conn: &Mutex<Connection>) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StorageError::LockPoisoned(e.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Sortable SQL image of a field value for its index column.
fn index_value(value: Option<&Value>) -> SqlValue {
    match value {
        None => SqlValue::Null,
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(Value::Number(n)) => SqlValue::Real(*n),
        Some(Value::DateTime(ts)) => SqlValue::Integer(ts.timestamp_micros()),
        Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
    }
}

/// Precomputed SQL for one table.
#[derive(Debug)]
struct TableLayout {
    table: String,
    /// Field names with an index column, in declaration order.
    indexed: Vec<String>,
    insert_sql: String,
    put_sql: String,
}

impl TableLayout {
    fn new(table: &str, spec: &StorageIndexSpec) -> Self {
        let indexed: Vec<String> = spec.indexed_fields().map(str::to_string).collect();
        let columns: Vec<String> = indexed.iter().map(|f| Self::column(f)).collect();

        let mut insert_columns = vec!["data".to_string()];
        insert_columns.extend(columns.iter().cloned());
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            insert_columns.join(", "),
            placeholders(insert_columns.len()),
        );

        let mut put_columns = vec!["id".to_string(), "data".to_string()];
        put_columns.extend(columns);
        let put_sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote_ident(table),
            put_columns.join(", "),
            placeholders(put_columns.len()),
        );

        Self {
            table: table.to_string(),
            indexed,
            insert_sql,
            put_sql,
        }
    }

    fn column(field: &str) -> String {
        quote_ident(&format!("ix_{field}"))
    }

    fn create_sql(&self) -> String {
        let table = quote_ident(&self.table);
        let mut columns = vec![
            "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            "data TEXT NOT NULL".to_string(),
        ];
        columns.extend(self.indexed.iter().map(|f| Self::column(f)));
        let mut sql = format!("CREATE TABLE IF NOT EXISTS {table} ({});\n", columns.join(", "));
        for field in &self.indexed {
            sql.push_str(&format!(
                "CREATE INDEX IF NOT EXISTS {} ON {table} ({});\n",
                quote_ident(&format!("{}_ix_{field}", self.table)),
                Self::column(field),
            ));
        }
        sql
    }

    fn index_values(&self, fields: &Fields) -> Vec<SqlValue> {
        self.indexed
            .iter()
            .map(|field| index_value(fields.get(field)))
            .collect()
    }

    fn insert(&self, conn: &Connection, mut fields: Fields) -> StorageResult<RecordId> {
        fields.remove(ID);
        let mut values = vec![SqlValue::Text(fields.to_json()?)];
        values.extend(self.index_values(&fields));
        conn.execute(&self.insert_sql, params_from_iter(values))?;
        Ok(RecordId::new(conn.last_insert_rowid()))
    }

    fn put(&self, conn: &Connection, mut record: Record) -> StorageResult<()> {
        check_explicit_id(record.id)?;
        record.fields.remove(ID);
        let mut values = vec![
            SqlValue::Integer(record.id.get()),
            SqlValue::Text(record.fields.to_json()?),
        ];
        values.extend(self.index_values(&record.fields));
        conn.execute(&self.put_sql, params_from_iter(values))?;
        Ok(())
    }

    fn fetch(&self, conn: &Connection, id: RecordId) -> StorageResult<Option<Record>> {
        let data: Option<String> = conn
            .query_row(
                &format!("SELECT data FROM {} WHERE id = ?1", quote_ident(&self.table)),
                params![id.get()],
                |row| row.get(0),
            )
            .optional()?;
        match data {
            Some(json) => Ok(Some(Record::new(id, Fields::from_json(&json)?))),
            None => Ok(None),
        }
    }

    fn remove(&self, conn: &Connection, id: RecordId) -> StorageResult<()> {
        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", quote_ident(&self.table)),
            params![id.get()],
        )?;
        Ok(())
    }

    fn select_all(&self, conn: &Connection, order: &str) -> StorageResult<Vec<Record>> {
        let sql = format!("SELECT id, data FROM {} {order}", quote_ident(&self.table));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        let mut records = Vec::new();
        for row in rows {
            let (id, json) = row?;
            records.push(Record::new(RecordId::new(id), Fields::from_json(&json)?));
        }
        Ok(records)
    }
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A [`Table`] stored in SQLite.
#[derive(Debug)]
pub struct SqliteTable {
    conn: Arc<Mutex<Connection>>,
    spec: StorageIndexSpec,
    layout: Arc<TableLayout>,
}

impl SqliteTable {
    /// Runs `op` on the blocking pool with the connection locked.
    async fn run<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &TableLayout) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let layout = Arc::clone(&self.layout);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            op(&mut guard, &layout)
        })
        .await?
    }
}

#[async_trait]
impl Table for SqliteTable {
    fn name(&self) -> &str {
        &self.layout.table
    }

    fn spec(&self) -> &StorageIndexSpec {
        &self.spec
    }

    async fn add(&self, fields: Fields) -> StorageResult<RecordId> {
        self.run(move |conn, layout| layout.insert(conn, fields)).await
    }

    async fn update(&self, id: RecordId, changes: Fields) -> StorageResult<()> {
        self.run(move |conn, layout| {
            let tx = conn.transaction()?;
            let current = layout.fetch(&tx, id)?.ok_or_else(|| StorageError::NotFound {
                table: layout.table.clone(),
                id,
            })?;
            layout.put(&tx, current.merged(&changes))?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: RecordId) -> StorageResult<()> {
        self.run(move |conn, layout| layout.remove(conn, id)).await
    }

    async fn get(&self, id: RecordId) -> StorageResult<Option<Record>> {
        self.run(move |conn, layout| layout.fetch(conn, id)).await
    }

    async fn bulk_get(&self, ids: &[RecordId]) -> StorageResult<Vec<Option<Record>>> {
        let ids = ids.to_vec();
        self.run(move |conn, layout| ids.into_iter().map(|id| layout.fetch(conn, id)).collect())
            .await
    }

    async fn bulk_add(&self, rows: Vec<Fields>) -> StorageResult<Vec<RecordId>> {
        self.run(move |conn, layout| {
            let tx = conn.transaction()?;
            let ids = rows
                .into_iter()
                .map(|fields| layout.insert(&tx, fields))
                .collect::<StorageResult<Vec<_>>>()?;
            tx.commit()?;
            Ok(ids)
        })
        .await
    }

    async fn bulk_put(&self, rows: Vec<Record>) -> StorageResult<()> {
        self.run(move |conn, layout| {
            let tx = conn.transaction()?;
            for record in rows {
                layout.put(&tx, record)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn bulk_delete(&self, ids: &[RecordId]) -> StorageResult<()> {
        let ids = ids.to_vec();
        self.run(move |conn, layout| {
            let tx = conn.transaction()?;
            for id in ids {
                layout.remove(&tx, id)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn ordered_desc(&self, field: &str) -> StorageResult<Vec<Record>> {
        let field = field.to_string();
        self.run(move |conn, layout| {
            if layout.indexed.contains(&field) {
                let order = format!("ORDER BY {} DESC, id DESC", TableLayout::column(&field));
                layout.select_all(conn, &order)
            } else {
                let mut records = layout.select_all(conn, "")?;
                sort_newest_first(&mut records, &field);
                Ok(records)
            }
        })
        .await
    }
}
