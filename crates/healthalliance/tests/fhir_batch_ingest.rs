use std::collections::HashMap;
use std::sync::Mutex;

use healthalliance::workflows::ingestion::{
    ingest_batch, FhirPatientRecord, PatientRecordStore, RawRecord, StoreError,
};
use serde_json::{json, Value};

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<String, FhirPatientRecord>>,
}

impl PatientRecordStore for MemoryStore {
    fn upsert(&self, record: FhirPatientRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.lock().expect("store mutex poisoned").len())
    }
}

struct OfflineStore;

impl PatientRecordStore for OfflineStore {
    fn upsert(&self, _record: FhirPatientRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("object storage offline".to_string()))
    }

    fn count(&self) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("object storage offline".to_string()))
    }
}

fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn patient(id: &str) -> RawRecord {
    record(json!({
        "resourceType": "Patient",
        "id": id,
        "gender": "female",
        "birthDate": "1971-04-02",
        "institutionId": "ukhd",
    }))
}

fn observation(id: &str) -> RawRecord {
    record(json!({
        "resourceType": "Observation",
        "id": id,
        "gender": "female",
        "birthDate": "1971-04-02",
    }))
}

#[test]
fn single_observation_is_rejected() {
    let store = MemoryStore::default();

    let summary = ingest_batch(&store, &[observation("obs-1")]).expect("batch completes");

    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(
        summary.errors[0].ends_with("must be 'Patient'"),
        "unexpected error text {:?}",
        summary.errors[0]
    );
    assert_eq!(store.count().expect("count"), 0);
}

#[test]
fn mixed_batch_accounts_for_every_record() {
    let store = MemoryStore::default();
    let batch = vec![
        patient("ukhd-1"),
        observation("obs-1"),
        patient("ukhd-2"),
        observation("obs-2"),
        patient("ukhd-3"),
    ];

    let summary = ingest_batch(&store, &batch).expect("batch completes");

    assert_eq!(summary.accepted, 3);
    assert_eq!(summary.rejected, 2);
    assert_eq!(summary.errors.len(), 2);
    assert!(summary.errors[0].starts_with("Record 1:"));
    assert!(summary.errors[1].starts_with("Record 3:"));
    assert_eq!(store.count().expect("count"), 3);

    let records = store.records.lock().expect("store mutex poisoned");
    let stored = records.get("ukhd-2").expect("record stored");
    assert_eq!(stored.institution_id.as_deref(), Some("ukhd"));
}

#[test]
fn records_missing_core_fields_are_rejected_individually() {
    let store = MemoryStore::default();
    let batch = vec![
        record(json!({"resourceType": "Patient", "id": "embl-9"})),
        patient("embl-10"),
    ];

    let summary = ingest_batch(&store, &batch).expect("batch completes");

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(
        summary.errors,
        vec!["Record 0: missing required fields: gender, birthDate".to_string()]
    );
}

#[test]
fn empty_batch_is_a_no_op() {
    let store = MemoryStore::default();
    let summary = ingest_batch(&store, &[]).expect("batch completes");

    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.rejected, 0);
    assert!(summary.errors.is_empty());
}

#[test]
fn storage_failure_propagates() {
    match ingest_batch(&OfflineStore, &[patient("dkfz-1")]) {
        Err(StoreError::Unavailable(reason)) => assert!(reason.contains("offline")),
        other => panic!("expected storage failure, got {other:?}"),
    }
}

#[test]
fn rejected_records_never_touch_storage() {
    let summary =
        ingest_batch(&OfflineStore, &[observation("obs-3")]).expect("nothing to store");
    assert_eq!(summary.rejected, 1);
}
