use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use super::fhir::{FhirPatientRecord, RawRecord};

/// Storage abstraction for accepted patient records.
pub trait PatientRecordStore: Send + Sync {
    /// Insert or replace the record keyed by its id.
    fn upsert(&self, record: FhirPatientRecord) -> Result<(), StoreError>;
    fn count(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize records: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Writes validated exports under `<root>/fhir/<institution>/<date>/records.json`,
/// mirroring the object-store key layout.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn key_for(institution: &str, date: NaiveDate) -> String {
        format!("fhir/{institution}/{}/records.json", date.format("%Y-%m-%d"))
    }

    pub fn write(
        &self,
        institution: &str,
        date: NaiveDate,
        records: &[RawRecord],
    ) -> Result<PathBuf, StoreError> {
        let path = self.root.join(Self::key_for(institution, date));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_vec(records)?;
        fs::write(&path, body)?;
        Ok(path)
    }
}
