use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw FHIR resource as received over the wire.
pub type RawRecord = Map<String, Value>;

/// Keys a Patient resource must carry to be accepted.
pub const REQUIRED_FIELDS: [&str; 4] = ["resourceType", "id", "gender", "birthDate"];

pub const PATIENT_RESOURCE: &str = "Patient";

/// True iff every required key is present. Values are not inspected.
pub fn validate_fhir_record(record: &RawRecord) -> bool {
    REQUIRED_FIELDS.iter().all(|field| record.contains_key(*field))
}

pub fn missing_fields(record: &RawRecord) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !record.contains_key(*field))
        .collect()
}

/// Accepted FHIR R4 Patient resource, reduced to the fields the platform uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FhirPatientRecord {
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    pub id: String,
    pub gender: String,
    #[serde(rename = "birthDate")]
    pub birth_date: String,
    #[serde(
        rename = "institutionId",
        alias = "institution_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub institution_id: Option<String>,
}

impl FhirPatientRecord {
    /// Project a record that already passed [`validate_fhir_record`].
    pub fn from_raw(record: &RawRecord) -> Option<Self> {
        if !validate_fhir_record(record) {
            return None;
        }

        Some(Self {
            resource_type: field_text(record, "resourceType"),
            id: field_text(record, "id"),
            gender: field_text(record, "gender"),
            birth_date: field_text(record, "birthDate"),
            institution_id: record
                .get("institutionId")
                .or_else(|| record.get("institution_id"))
                .filter(|value| !value.is_null())
                .map(text),
        })
    }
}

fn field_text(record: &RawRecord, key: &str) -> String {
    record.get(key).map(text).unwrap_or_default()
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Normalized row produced from an institution's export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRow {
    pub patient_id: String,
    pub institution: String,
    pub gender: String,
    pub birth_date: String,
}

/// Tag valid records with their institution; invalid ones are skipped.
pub fn parse_institution_records(institution: &str, records: &[RawRecord]) -> Vec<PatientRow> {
    records
        .iter()
        .filter_map(FhirPatientRecord::from_raw)
        .map(|record| PatientRow {
            patient_id: record.id,
            institution: institution.to_string(),
            gender: record.gender,
            birth_date: record.birth_date,
        })
        .collect()
}
