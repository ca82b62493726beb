use stash_model::StorageIndexSpec;
use stash_storage::{MemoryBackend, MemoryTable, StorageError, Table, TableProvider};
use stash_types::{Fields, Record, RecordId};

#[tokio::test]
async fn same_name_returns_shared_table() {
    let backend = MemoryBackend::new();
    let a = backend.open_table("goals", &StorageIndexSpec::default()).await.unwrap();
    let b = backend.open_table("goals", &StorageIndexSpec::default()).await.unwrap();

    let id = a.add(Fields::new().with("title", "shared")).await.unwrap();
    assert!(b.get(id).await.unwrap().is_some());
}

#[tokio::test]
async fn concrete_table_lookup() {
    let backend = MemoryBackend::new();
    assert!(backend.table("goals").is_none());

    let handle = backend.open_table("goals", &StorageIndexSpec::default()).await.unwrap();
    handle.add(Fields::new()).await.unwrap();

    let table = backend.table("goals").unwrap();
    assert_eq!(table.len().await, 1);
    assert!(!table.is_empty().await);
}

#[tokio::test]
async fn failed_bulk_add_leaves_counter_untouched() {
    let table = MemoryTable::new("goals", StorageIndexSpec::default());
    table
        .bulk_put(vec![Record::new(RecordId::new(i64::MAX - 1), Fields::new())])
        .await
        .unwrap();

    let err = table
        .bulk_add(vec![Fields::new(), Fields::new()])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)), "{err:?}");
    assert_eq!(table.len().await, 1);

    let last = table.add(Fields::new()).await.unwrap();
    assert_eq!(last, RecordId::new(i64::MAX));
}

#[test]
fn backend_kind() {
    assert_eq!(MemoryBackend::new().kind(), "memory");
}
