mod common;

use common::{Guitars, guitar, init_tracing};
use pretty_assertions::assert_eq;
use stash_entity::{BulkUpdate, EntityRegistry, StashConfig, StorageConfig};
use stash_types::RecordId;
use std::path::Path;

fn config(path: &Path) -> StashConfig {
    StashConfig {
        storage: StorageConfig::Sqlite {
            path: path.to_path_buf(),
            busy_timeout_ms: 1000,
        },
    }
}

fn names(records: &[stash_types::Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get_str("name").unwrap_or_default().to_string())
        .collect()
}

// ── Persistence ──────────────────────────────────────────────────

#[tokio::test]
async fn records_survive_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stash.db");

    let ids = {
        let registry = EntityRegistry::from_config(&config(&path)).unwrap();
        let guitars = registry.entity::<Guitars>().await.unwrap();
        let ids = guitars
            .bulk_add(vec![guitar(" Explorer "), guitar("Firebird")])
            .await
            .unwrap();
        guitars
            .update(ids[0], guitar("Explorer '58"))
            .await
            .unwrap();
        ids
    };

    let registry = EntityRegistry::from_config(&config(&path)).unwrap();
    let guitars = registry.entity::<Guitars>().await.unwrap();
    assert_eq!(guitars.cache().generation(), 1);
    assert_eq!(names(&guitars.records()), ["Firebird", "Explorer '58"]);

    let loaded = guitars.load().await.unwrap();
    assert_eq!(*guitars.records(), loaded);

    assert_eq!(names(&loaded), ["Firebird", "Explorer '58"]);
    assert_eq!(loaded[1].id, ids[0]);
    assert!(loaded[1].updated_at() > loaded[1].created_at());
    assert_eq!(loaded[0].created_at(), loaded[0].updated_at());
}

#[tokio::test]
async fn full_lifecycle_on_sqlite() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let registry = EntityRegistry::from_config(&config(&dir.path().join("stash.db"))).unwrap();
    let guitars = registry.entity::<Guitars>().await.unwrap();

    let a = guitars.add(guitar("A")).await.unwrap();
    let more = guitars.bulk_add(vec![guitar("B"), guitar("C")]).await.unwrap();
    assert_eq!(names(&guitars.records()), ["C", "B", "A"]);

    guitars
        .bulk_update(vec![
            BulkUpdate::new(a, guitar("A2")),
            BulkUpdate::new(more[0], guitar("B2")),
        ])
        .await
        .unwrap();
    assert_eq!(names(&guitars.records()), ["C", "B2", "A2"]);

    let err = guitars
        .bulk_update(vec![BulkUpdate::new(RecordId::new(99), guitar("Z"))])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("99"));

    guitars.delete(more[1]).await.unwrap();
    guitars.bulk_delete(&[a]).await.unwrap();
    assert_eq!(names(&guitars.records()), ["B2"]);
    assert_eq!(*guitars.records(), guitars.load().await.unwrap());
}
