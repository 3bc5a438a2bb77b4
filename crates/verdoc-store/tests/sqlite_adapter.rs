//! Adapter behavior over the file-backed SQLite store, including migration
//! of data written by an earlier process run.

#![cfg(feature = "sqlite")]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use verdoc::{JsonCodec, VersionTag};
use verdoc_migrate::{Migration, MigrationError, Versioned};
use verdoc_store::{DocumentStore, SqliteStore, VersionAdapter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ReadingV1 {
    sensor: String,
    celsius: f64,
}

impl Versioned for ReadingV1 {
    const VERSION: &'static str = "1";
    const TABLE: &'static str = "readings";

    fn key(&self) -> &str {
        &self.sensor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ReadingV2 {
    sensor: String,
    value: f64,
    unit: String,
}

impl Versioned for ReadingV2 {
    const VERSION: &'static str = "2";
    const TABLE: &'static str = "readings";

    fn key(&self) -> &str {
        &self.sensor
    }

    fn migrations() -> Vec<Box<dyn Migration>> {
        vec![Box::new(LabelUnit)]
    }
}

/// V1 -> V2: `celsius` becomes `value` with an explicit `unit`.
struct LabelUnit;

impl Migration for LabelUnit {
    fn applies_to(&self) -> VersionTag {
        "1".into()
    }
    fn target_version(&self) -> VersionTag {
        "2".into()
    }
    fn migrate(&self, mut payload: Value) -> Result<Value, MigrationError> {
        let obj = payload
            .as_object_mut()
            .ok_or_else(|| MigrationError::InvalidPayload("not an object".into()))?;
        let celsius = obj
            .remove("celsius")
            .ok_or_else(|| MigrationError::MissingField {
                field: "celsius".into(),
            })?;
        obj.insert("value".into(), celsius);
        obj.insert("unit".into(), serde_json::json!("celsius"));
        Ok(payload)
    }
}

#[test]
fn migrates_data_written_by_a_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("readings.db");
    let codec = JsonCodec::new();

    // First run: old binary writes version 1 documents.
    {
        let store = SqliteStore::open(&db_path).unwrap();
        let mut v1: VersionAdapter<ReadingV1, _> =
            VersionAdapter::new(store, codec.clone()).unwrap();
        v1.save(&ReadingV1 {
            sensor: "s-1".into(),
            celsius: 22.5,
        })
        .unwrap();
    }

    // Second run: new binary reads them at version 2.
    let store = SqliteStore::open(&db_path).unwrap();
    let v2: VersionAdapter<ReadingV2, _> = VersionAdapter::new(store, codec).unwrap();
    let reading = v2.get("s-1").unwrap();
    assert_eq!(
        reading,
        ReadingV2 {
            sensor: "s-1".into(),
            value: 22.5,
            unit: "celsius".into(),
        }
    );
}

#[test]
fn bulk_rewrite_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("readings.db");
    let codec = JsonCodec::new();

    {
        let store = SqliteStore::open(&db_path).unwrap();
        let mut v1: VersionAdapter<ReadingV1, _> =
            VersionAdapter::new(store, codec.clone()).unwrap();
        for i in 0..3 {
            v1.save(&ReadingV1 {
                sensor: format!("s-{i}"),
                celsius: 20.0 + i as f64,
            })
            .unwrap();
        }
    }

    {
        let store = SqliteStore::open(&db_path).unwrap();
        let mut v2: VersionAdapter<ReadingV2, _> =
            VersionAdapter::new(store, codec.clone()).unwrap();
        assert_eq!(v2.migrate_all(&"1".into()).unwrap(), 3);
    }

    let store = SqliteStore::open(&db_path).unwrap();
    assert!(store
        .scan_by_version("readings", &VersionTag::new("1"))
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .scan_by_version("readings", &VersionTag::new("2"))
            .unwrap()
            .len(),
        3
    );
}
