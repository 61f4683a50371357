use serde::{Deserialize, Serialize};

use super::domain::RiskTier;
use super::features::{FeatureColumn, FeatureVector};

/// Weighted threshold rules. Weights are whole hundredths so the additive sum
/// lands exactly on the tier boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRules {
    pub age_threshold: f64,
    pub age_weight: u32,
    pub encounter_threshold: f64,
    pub encounter_weight: u32,
    pub condition_threshold: f64,
    pub condition_weight: u32,
    pub medication_threshold: f64,
    pub medication_weight: u32,
    pub medium_floor: u32,
    pub high_floor: u32,
}

impl RiskRules {
    pub const fn standard() -> Self {
        Self {
            age_threshold: 65.0,
            age_weight: 30,
            encounter_threshold: 3.0,
            encounter_weight: 20,
            condition_threshold: 2.0,
            condition_weight: 25,
            medication_threshold: 5.0,
            medication_weight: 15,
            medium_floor: 30,
            high_floor: 60,
        }
    }
}

impl Default for RiskRules {
    fn default() -> Self {
        Self::standard()
    }
}

/// A rule that fired while scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskComponent {
    pub factor: FeatureColumn,
    pub weight: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskScore {
    /// Clamped to `[0, 1]` and rounded to two decimals.
    pub score: f64,
    pub tier: RiskTier,
    pub components: Vec<RiskComponent>,
}

/// Stateless rule engine; identical input always yields identical output.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    rules: RiskRules,
}

const FULL_SCALE: u32 = 100;

impl RiskScorer {
    pub fn new(rules: RiskRules) -> Self {
        Self { rules }
    }

    pub fn score(&self, features: &FeatureVector) -> RiskScore {
        let rules = &self.rules;
        let checks = [
            (
                FeatureColumn::Age,
                rules.age_threshold,
                rules.age_weight,
                "age",
            ),
            (
                FeatureColumn::RecentEncounters,
                rules.encounter_threshold,
                rules.encounter_weight,
                "recent encounters",
            ),
            (
                FeatureColumn::NumConditions,
                rules.condition_threshold,
                rules.condition_weight,
                "active conditions",
            ),
            (
                FeatureColumn::NumMedications,
                rules.medication_threshold,
                rules.medication_weight,
                "active medications",
            ),
        ];

        let mut hundredths: u32 = 0;
        let mut components = Vec::new();
        for (factor, threshold, weight, label) in checks {
            let value = features.get(factor);
            if value > threshold {
                hundredths = hundredths.saturating_add(weight);
                components.push(RiskComponent {
                    factor,
                    weight: f64::from(weight) / 100.0,
                    notes: format!("{label} {value} above {threshold}"),
                });
            }
        }

        let hundredths = hundredths.min(FULL_SCALE);

        RiskScore {
            score: f64::from(hundredths) / 100.0,
            tier: self.tier_for(hundredths),
            components,
        }
    }

    fn tier_for(&self, hundredths: u32) -> RiskTier {
        if hundredths < self.rules.medium_floor {
            RiskTier::Low
        } else if hundredths < self.rules.high_floor {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}
