pub mod ingestion;
pub mod readmission;
