use axum::extract::{FromRequest, Request};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use healthalliance::access::API_KEY_HEADER;
use healthalliance::error::AppError;
use healthalliance::workflows::ingestion::{FhirPatientRecord, PatientRecordStore, StoreError};
use healthalliance::workflows::readmission::PredictionService;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::metrics::MetricsPredictionRecorder;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) predictions: Arc<PredictionService<MetricsPredictionRecorder>>,
    pub(crate) records: Arc<InMemoryPatientStore>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPatientStore {
    records: Arc<Mutex<HashMap<String, FhirPatientRecord>>>,
}

impl PatientRecordStore for InMemoryPatientStore {
    fn upsert(&self, record: FhirPatientRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("record store mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let guard = self.records.lock().expect("record store mutex poisoned");
        Ok(guard.len())
    }
}

/// API key presented by the caller, if any. Non-UTF-8 values count as absent.
pub(crate) fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// JSON body extractor whose rejections surface as 422 with the binding detail.
pub(crate) struct ApiJson<T>(pub(crate) T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::InvalidRequest(rejection.body_text())),
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
