use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::fhir::{missing_fields, FhirPatientRecord, RawRecord, PATIENT_RESOURCE};
use super::store::{PatientRecordStore, StoreError};

/// Per-batch accounting returned to the submitter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub errors: Vec<String>,
}

/// Why a single record was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordRejection {
    #[error("Record {index}: resourceType '{found}' must be 'Patient'")]
    WrongResourceType { index: usize, found: String },
    #[error("Record {index}: missing required fields: {}", .missing.join(", "))]
    MissingFields {
        index: usize,
        missing: Vec<&'static str>,
    },
}

/// Check one record; `index` is its position in the submitted batch.
pub fn check_record(index: usize, record: &RawRecord) -> Result<FhirPatientRecord, RecordRejection> {
    match record.get("resourceType") {
        Some(Value::String(kind)) if kind == PATIENT_RESOURCE => {}
        Some(other) => {
            let found = match other {
                Value::String(kind) => kind.clone(),
                value => value.to_string(),
            };
            return Err(RecordRejection::WrongResourceType { index, found });
        }
        None => {}
    }

    let missing = missing_fields(record);
    if !missing.is_empty() {
        return Err(RecordRejection::MissingFields { index, missing });
    }

    FhirPatientRecord::from_raw(record).ok_or(RecordRejection::MissingFields {
        index,
        missing: Vec::new(),
    })
}

/// Evaluate each record independently and persist the accepted ones.
///
/// Rejections never abort the batch; only a storage failure does.
pub fn ingest_batch<S>(store: &S, records: &[RawRecord]) -> Result<IngestSummary, StoreError>
where
    S: PatientRecordStore + ?Sized,
{
    let mut summary = IngestSummary::default();

    for (index, record) in records.iter().enumerate() {
        match check_record(index, record) {
            Ok(patient) => {
                store.upsert(patient)?;
                summary.accepted += 1;
            }
            Err(rejection) => {
                debug!(%rejection, "fhir record rejected");
                summary.rejected += 1;
                summary.errors.push(rejection.to_string());
            }
        }
    }

    info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        "fhir batch ingested"
    );
    Ok(summary)
}
