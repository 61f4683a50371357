use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::domain::{PatientRiskInput, RiskAssessment, RiskTier, FIXED_CONFIDENCE};
use super::features::FeatureVector;
use super::scoring::{RiskComponent, RiskRules, RiskScorer};
use crate::access::{AccessDenied, ApiKeyAllowlist};

/// Measurements captured for one authorized prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionEvent {
    pub tier: RiskTier,
    pub confidence: f64,
    pub elapsed: Duration,
}

/// Instrumentation sink so the service can run without a global registry.
pub trait PredictionRecorder: Send + Sync {
    fn record(&self, event: &PredictionEvent);
}

/// Service composing the API-key gate with the risk scorer.
pub struct PredictionService<R> {
    gate: ApiKeyAllowlist,
    scorer: RiskScorer,
    recorder: Arc<R>,
}

impl<R> PredictionService<R>
where
    R: PredictionRecorder + 'static,
{
    pub fn new(gate: ApiKeyAllowlist, recorder: Arc<R>) -> Self {
        Self::with_rules(gate, recorder, RiskRules::standard())
    }

    pub fn with_rules(gate: ApiKeyAllowlist, recorder: Arc<R>, rules: RiskRules) -> Self {
        Self {
            gate,
            scorer: RiskScorer::new(rules),
            recorder,
        }
    }

    pub fn gate(&self) -> &ApiKeyAllowlist {
        &self.gate
    }

    /// Score a patient for a caller presenting `credential`.
    ///
    /// Rejected callers never reach the scorer and produce no prediction
    /// event; accepted ones produce exactly one.
    pub fn predict(
        &self,
        credential: Option<&str>,
        input: &PatientRiskInput,
    ) -> Result<RiskAssessment, PredictionError> {
        self.gate.authorize(credential)?;

        let started = Instant::now();
        let (assessment, components) = explain(&self.scorer, input);

        self.recorder.record(&PredictionEvent {
            tier: assessment.risk_level,
            confidence: assessment.confidence,
            elapsed: started.elapsed(),
        });

        debug!(
            patient_id = %assessment.patient_id,
            factors = ?components.iter().map(|c| c.notes.as_str()).collect::<Vec<_>>(),
            "risk rules fired"
        );
        info!(
            patient_id = %assessment.patient_id,
            risk_level = %assessment.risk_level,
            readmission_risk = assessment.readmission_risk,
            "readmission risk assessed"
        );

        Ok(assessment)
    }
}

/// Pure scoring path shared by the service and offline tooling.
pub fn assess(scorer: &RiskScorer, input: &PatientRiskInput) -> RiskAssessment {
    explain(scorer, input).0
}

/// Like [`assess`], also returning the rules that contributed to the score.
pub fn explain(
    scorer: &RiskScorer,
    input: &PatientRiskInput,
) -> (RiskAssessment, Vec<RiskComponent>) {
    let features = FeatureVector::from(input);
    let score = scorer.score(&features);

    let assessment = RiskAssessment {
        patient_id: input.patient_id.clone(),
        readmission_risk: score.score,
        risk_level: score.tier,
        confidence: FIXED_CONFIDENCE,
        recommendations: score.tier.recommendations(),
    };
    (assessment, score.components)
}

/// Error raised by the prediction service.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AccessDenied),
}
