//! Readmission risk: feature preparation, rule scoring, and the gated
//! prediction service.

pub mod domain;
pub mod features;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{PatientRiskInput, RiskAssessment, RiskTier, FIXED_CONFIDENCE};
pub use features::{encode_gender, FeatureColumn, FeatureError, FeatureTable, FeatureVector};
pub use scoring::{RiskComponent, RiskRules, RiskScore, RiskScorer};
pub use service::{assess, explain, PredictionError, PredictionEvent, PredictionRecorder, PredictionService};
