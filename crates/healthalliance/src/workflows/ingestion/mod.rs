//! FHIR Patient intake from the partner institutions.

pub mod batch;
pub mod fhir;
pub mod pipeline;
pub mod store;

pub use batch::{check_record, ingest_batch, IngestSummary, RecordRejection};
pub use fhir::{
    parse_institution_records, validate_fhir_record, FhirPatientRecord, PatientRow, RawRecord,
    REQUIRED_FIELDS,
};
pub use pipeline::{PipelineReport, ValidatedRecords, ValidationStats};
pub use store::{DirectorySink, PatientRecordStore, StoreError};
