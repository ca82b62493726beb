use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use stash_types::{CREATED_AT, Fields, ID, Record, RecordId, UPDATED_AT, Value, is_base_field};

fn guitar() -> Fields {
    Fields::new()
        .with("name", "Les Paul")
        .with("strings", 6)
        .with("acoustic", false)
}

// ── Base fields ──────────────────────────────────────────────────

#[test]
fn base_field_names() {
    assert!(is_base_field(ID));
    assert!(is_base_field(CREATED_AT));
    assert!(is_base_field(UPDATED_AT));
    assert!(!is_base_field("name"));
}

// ── Fields ───────────────────────────────────────────────────────

#[test]
fn typed_getters() {
    let f = guitar();
    assert_eq!(f.get_str("name"), Some("Les Paul"));
    assert_eq!(f.get_number("strings"), Some(6.0));
    assert_eq!(f.get_bool("acoustic"), Some(false));
    assert_eq!(f.get_str("strings"), None);
    assert_eq!(f.get("missing"), None);
}

#[test]
fn merge_overlays_changes() {
    let mut f = guitar();
    f.merge(Fields::new().with("name", "SG").with("color", "red"));
    assert_eq!(f.get_str("name"), Some("SG"));
    assert_eq!(f.get_str("color"), Some("red"));
    assert_eq!(f.get_number("strings"), Some(6.0));
    assert_eq!(f.len(), 4);
}

#[test]
fn retain_drops_fields() {
    let mut f = guitar();
    f.retain(|name, _| name != "acoustic");
    assert!(!f.contains("acoustic"));
    assert_eq!(f.names().collect::<Vec<_>>(), vec!["name", "strings"]);
}

#[test]
fn json_round_trip_preserves_fields() {
    let ts = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
    let f = guitar().with(CREATED_AT, ts);
    let back = Fields::from_json(&f.to_json().unwrap()).unwrap();
    assert_eq!(back, f);
}

#[test]
fn from_json_rejects_garbage() {
    assert!(Fields::from_json("not json").is_err());
}

// ── Record ───────────────────────────────────────────────────────

#[test]
fn record_timestamps() {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let updated = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let record = Record::new(
        RecordId::new(3),
        guitar().with(CREATED_AT, created).with(UPDATED_AT, updated),
    );
    assert_eq!(record.created_at(), Some(created));
    assert_eq!(record.updated_at(), Some(updated));
}

#[test]
fn merged_keeps_id_and_unchanged_fields() {
    let record = Record::new(RecordId::new(9), guitar());
    let merged = record.merged(&Fields::new().with("name", "Telecaster").with(ID, 100));
    assert_eq!(merged.id, RecordId::new(9));
    assert_eq!(merged.get_str("name"), Some("Telecaster"));
    assert_eq!(merged.get_number("strings"), Some(6.0));
    assert_eq!(merged.get(ID), None::<&Value>);
}
