use serde::{Deserialize, Serialize};

/// Placeholder confidence reported with every assessment; not calibrated.
pub const FIXED_CONFIDENCE: f64 = 0.85;

/// Structured patient summary submitted for a readmission estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRiskInput {
    pub patient_id: String,
    pub age: u32,
    pub gender: String,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub recent_encounters: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
}

/// Coarse bucket derived from the continuous risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const fn ordered() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn recommendations(self) -> Vec<String> {
        let steps: &[&str] = match self {
            Self::Low => &["Regular follow-up in 3 months"],
            Self::Medium => &[
                "Schedule follow-up in 2 weeks",
                "Monitor medication adherence",
            ],
            Self::High => &[
                "Immediate follow-up within 48 hours",
                "Consider home health services",
                "Review medication plan",
            ],
        };
        steps.iter().map(|step| step.to_string()).collect()
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Response payload for a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub patient_id: String,
    pub readmission_risk: f64,
    pub risk_level: RiskTier,
    pub confidence: f64,
    pub recommendations: Vec<String>,
}
