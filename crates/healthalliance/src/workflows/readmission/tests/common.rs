use std::sync::{Arc, Mutex};

use crate::access::ApiKeyAllowlist;
use crate::workflows::readmission::{
    PatientRiskInput, PredictionEvent, PredictionRecorder, PredictionService,
};

pub(super) const VALID_KEY: &str = "dev-key-dkfz";

#[derive(Default)]
pub(super) struct MemoryRecorder {
    events: Mutex<Vec<PredictionEvent>>,
}

impl PredictionRecorder for MemoryRecorder {
    fn record(&self, event: &PredictionEvent) {
        self.events
            .lock()
            .expect("recorder mutex poisoned")
            .push(*event);
    }
}

impl MemoryRecorder {
    pub(super) fn events(&self) -> Vec<PredictionEvent> {
        self.events.lock().expect("recorder mutex poisoned").clone()
    }
}

pub(super) fn allowlist() -> ApiKeyAllowlist {
    ApiKeyAllowlist::new([VALID_KEY, "dev-key-ukhd"])
}

pub(super) fn service() -> (PredictionService<MemoryRecorder>, Arc<MemoryRecorder>) {
    let recorder = Arc::new(MemoryRecorder::default());
    (
        PredictionService::new(allowlist(), recorder.clone()),
        recorder,
    )
}

fn items(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}-{i}")).collect()
}

pub(super) fn patient(
    age: u32,
    conditions: usize,
    medications: usize,
    recent_encounters: u32,
) -> PatientRiskInput {
    PatientRiskInput {
        patient_id: format!("ukhd-{age}-{conditions}-{medications}-{recent_encounters}"),
        age,
        gender: "female".to_string(),
        conditions: items("condition", conditions),
        medications: items("medication", medications),
        recent_encounters,
        institution_id: Some("ukhd".to_string()),
    }
}
