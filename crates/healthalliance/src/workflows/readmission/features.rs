//! Tabular feature preparation for the readmission model.
//!
//! Columns always come out in [`FeatureColumn::ordered`] order. A column the
//! source never carried is left out entirely; a blank cell becomes `0.0`.

use std::collections::HashMap;
use std::io::Read;

use serde::Serialize;

use super::domain::PatientRiskInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    Age,
    NumConditions,
    NumMedications,
    RecentEncounters,
    GenderEncoded,
}

impl FeatureColumn {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Age,
            Self::NumConditions,
            Self::NumMedications,
            Self::RecentEncounters,
            Self::GenderEncoded,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::NumConditions => "num_conditions",
            Self::NumMedications => "num_medications",
            Self::RecentEncounters => "recent_encounters",
            Self::GenderEncoded => "gender_encoded",
        }
    }

    /// Source column the feature is derived from.
    const fn source(self) -> &'static str {
        match self {
            Self::GenderEncoded => "gender",
            other => other.name(),
        }
    }
}

/// `1.0` for "male" (any case), `0.0` for everything else, including
/// "female", "other" and blanks.
pub fn encode_gender(gender: &str) -> f64 {
    if gender.to_lowercase() == "male" {
        1.0
    } else {
        0.0
    }
}

/// Full five-column vector for a single patient.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FeatureVector {
    pub age: f64,
    pub num_conditions: f64,
    pub num_medications: f64,
    pub recent_encounters: f64,
    pub gender_encoded: f64,
}

impl FeatureVector {
    /// Build from a partial name/value map; unknown names are ignored and
    /// missing features default to zero.
    pub fn from_map(values: &HashMap<String, f64>) -> Self {
        let get = |column: FeatureColumn| values.get(column.name()).copied().unwrap_or(0.0);
        Self {
            age: get(FeatureColumn::Age),
            num_conditions: get(FeatureColumn::NumConditions),
            num_medications: get(FeatureColumn::NumMedications),
            recent_encounters: get(FeatureColumn::RecentEncounters),
            gender_encoded: get(FeatureColumn::GenderEncoded),
        }
    }

    pub fn get(&self, column: FeatureColumn) -> f64 {
        match column {
            FeatureColumn::Age => self.age,
            FeatureColumn::NumConditions => self.num_conditions,
            FeatureColumn::NumMedications => self.num_medications,
            FeatureColumn::RecentEncounters => self.recent_encounters,
            FeatureColumn::GenderEncoded => self.gender_encoded,
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        FeatureColumn::ordered().map(|column| self.get(column))
    }
}

impl From<&PatientRiskInput> for FeatureVector {
    fn from(input: &PatientRiskInput) -> Self {
        Self {
            age: f64::from(input.age),
            num_conditions: input.conditions.len() as f64,
            num_medications: input.medications.len() as f64,
            recent_encounters: f64::from(input.recent_encounters),
            gender_encoded: encode_gender(&input.gender),
        }
    }
}

/// Extracted features for a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    pub columns: Vec<FeatureColumn>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn column(&self, column: FeatureColumn) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| *c == column)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse a CSV export with a header row into the feature table.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, FeatureError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let positions: Vec<(FeatureColumn, usize)> = FeatureColumn::ordered()
            .into_iter()
            .filter_map(|column| {
                headers
                    .iter()
                    .position(|header| header == column.source())
                    .map(|index| (column, index))
            })
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let mut row = Vec::with_capacity(positions.len());

            for &(column, index) in &positions {
                let cell = record.get(index).unwrap_or("");
                row.push(cell_value(column, cell, line)?);
            }
            rows.push(row);
        }

        Ok(Self {
            columns: positions.into_iter().map(|(column, _)| column).collect(),
            rows,
        })
    }
}

fn cell_value(column: FeatureColumn, cell: &str, line: u64) -> Result<f64, FeatureError> {
    if column == FeatureColumn::GenderEncoded {
        return Ok(encode_gender(cell));
    }
    if cell.is_empty() {
        return Ok(0.0);
    }

    let value = cell
        .parse::<f64>()
        .map_err(|_| FeatureError::InvalidNumber {
            line,
            column: column.name(),
            value: cell.to_string(),
        })?;

    Ok(if value.is_nan() { 0.0 } else { value })
}

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("invalid patient CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: column '{column}' holds non-numeric value '{value}'")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
}
