//! Daily ingestion run: fetch → validate → store.
//!
//! Institution feeds are simulated; each stage hands its output to the next
//! and any storage failure is returned to the caller, which owns retries.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::fhir::{validate_fhir_record, RawRecord};
use super::store::{DirectorySink, StoreError};
use crate::institutions;

const RECORDS_PER_INSTITUTION: usize = 5;
const SYNTHETIC_BIRTH_DATE: &str = "1960-01-01";

/// Valid/invalid counts for one institution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedRecords {
    pub records: BTreeMap<String, Vec<RawRecord>>,
    pub stats: BTreeMap<String, ValidationStats>,
}

/// Outcome of a full run, suitable for CLI output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub execution_date: NaiveDate,
    pub stats: BTreeMap<String, ValidationStats>,
    pub written: Vec<PathBuf>,
}

/// Synthetic Patient bundle for every partner institution.
pub fn fetch_from_institutions(execution_date: NaiveDate) -> BTreeMap<String, Vec<RawRecord>> {
    let date = execution_date.format("%Y-%m-%d").to_string();
    let mut fetched = BTreeMap::new();

    for institution in institutions::ids() {
        let records: Vec<RawRecord> = (0..RECORDS_PER_INSTITUTION)
            .filter_map(|i| {
                let gender = if i % 2 == 0 { "male" } else { "female" };
                match json!({
                    "resourceType": "Patient",
                    "id": format!("{institution}-{date}-{i}"),
                    "gender": gender,
                    "birthDate": SYNTHETIC_BIRTH_DATE,
                }) {
                    Value::Object(map) => Some(map),
                    _ => None,
                }
            })
            .collect();

        info!(institution, date = %date, fetched = records.len(), "fetched institution records");
        fetched.insert(institution.to_string(), records);
    }

    fetched
}

pub fn validate(raw: BTreeMap<String, Vec<RawRecord>>) -> ValidatedRecords {
    let mut validated = ValidatedRecords::default();

    for (institution, records) in raw {
        let total = records.len();
        let valid: Vec<RawRecord> = records
            .into_iter()
            .filter(validate_fhir_record)
            .collect();
        let stats = ValidationStats {
            valid: valid.len(),
            invalid: total - valid.len(),
        };

        info!(
            institution = %institution,
            valid = stats.valid,
            invalid = stats.invalid,
            "validated institution records"
        );
        validated.stats.insert(institution.clone(), stats);
        validated.records.insert(institution, valid);
    }

    validated
}

pub fn store(
    sink: &DirectorySink,
    execution_date: NaiveDate,
    validated: &ValidatedRecords,
) -> Result<Vec<PathBuf>, StoreError> {
    let mut written = Vec::with_capacity(validated.records.len());

    for (institution, records) in &validated.records {
        let path = sink.write(institution, execution_date, records)?;
        info!(
            institution = %institution,
            records = records.len(),
            path = %path.display(),
            "stored validated records"
        );
        written.push(path);
    }

    Ok(written)
}

pub fn run(sink: &DirectorySink, execution_date: NaiveDate) -> Result<PipelineReport, StoreError> {
    let raw = fetch_from_institutions(execution_date);
    let validated = validate(raw);
    let written = store(sink, execution_date, &validated)?;

    Ok(PipelineReport {
        execution_date,
        stats: validated.stats,
        written,
    })
}
