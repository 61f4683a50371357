use crate::infra::{api_key, ApiJson, AppState};
use crate::metrics::track_requests;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use healthalliance::error::AppError;
use healthalliance::institutions;
use healthalliance::workflows::ingestion::{
    ingest_batch, IngestSummary, PatientRecordStore, RawRecord,
};
use healthalliance::workflows::readmission::{PatientRiskInput, RiskAssessment};
use healthalliance::SERVICE_VERSION;
use serde_json::json;
use tracing::{info, warn};

pub(crate) fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/predict", post(predict_endpoint))
        .route("/api/v1/institutions", get(institutions_endpoint))
        .route("/api/v1/data/ingest", post(ingest_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(root_endpoint))
        .route("/health", get(healthcheck))
        .merge(protected)
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// Rejects the request before extraction so a bad key wins over a bad body.
pub(crate) async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(denied) = state.predictions.gate().authorize(api_key(request.headers())) {
        warn!(path = %request.uri().path(), reason = %denied, "request rejected by API key gate");
        return Err(denied.into());
    }

    Ok(next.run(request).await)
}

pub(crate) async fn root_endpoint() -> Json<serde_json::Value> {
    let partners: Vec<String> = institutions::ids()
        .map(|id| id.to_ascii_uppercase())
        .collect();

    Json(json!({
        "message": "HealthAlliance DataSpace MLOps Platform",
        "version": SERVICE_VERSION,
        "institutions": partners,
        "endpoints": {
            "health": "/health",
            "predict": "/api/v1/predict",
            "institutions": "/api/v1/institutions",
            "ingest": "/api/v1/data/ingest",
        },
    }))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": SERVICE_VERSION,
        "services": {
            "api": "running",
            "record_store": "available",
            "metrics": "available",
        },
    }))
}

pub(crate) async fn predict_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<PatientRiskInput>,
) -> Result<Json<RiskAssessment>, AppError> {
    let assessment = state.predictions.predict(api_key(&headers), &input)?;
    Ok(Json(assessment))
}

pub(crate) async fn institutions_endpoint() -> Json<serde_json::Value> {
    Json(json!({ "institutions": institutions::directory() }))
}

pub(crate) async fn ingest_endpoint(
    State(state): State<AppState>,
    ApiJson(records): ApiJson<Vec<RawRecord>>,
) -> Result<Json<IngestSummary>, AppError> {
    let summary = ingest_batch(state.records.as_ref(), &records)?;
    let stored = state.records.count()?;
    info!(stored, "patient record store updated");
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryPatientStore;
    use crate::metrics::MetricsPredictionRecorder;
    use axum::body::Body;
    use axum::http::{header, Method, StatusCode};
    use healthalliance::access::ApiKeyAllowlist;
    use healthalliance::workflows::readmission::PredictionService;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const KEY: &str = "dev-key-dkfz";

    fn state() -> AppState {
        AppState {
            predictions: Arc::new(PredictionService::new(
                ApiKeyAllowlist::from_comma_separated("dev-key-dkfz, dev-key-ukhd"),
                Arc::new(MetricsPredictionRecorder),
            )),
            records: Arc::new(InMemoryPatientStore::default()),
        }
    }

    fn request(method: Method, uri: &str, key: Option<&str>, body: Option<Value>) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("serializable body"))
            }
            None => Body::empty(),
        };
        builder.body(body).expect("request builds")
    }

    async fn send(app: Router, request: Request) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router responds");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("json payload")
        };
        (status, json)
    }

    fn high_risk_patient() -> Value {
        json!({
            "patient_id": "TEST001",
            "age": 80,
            "gender": "male",
            "conditions": ["diabetes", "hypertension", "ckd"],
            "medications": ["metformin", "lisinopril", "insulin", "aspirin", "statin", "furosemide"],
            "recent_encounters": 5,
            "institution_id": "dkfz",
        })
    }

    #[tokio::test]
    async fn root_and_health_need_no_key() {
        let (status, body) = send(router(state()), request(Method::GET, "/", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["institutions"], json!(["DKFZ", "UKHD", "EMBL"]));

        let (status, body) =
            send(router(state()), request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body.get("version").is_some());
    }

    #[tokio::test]
    async fn predict_scores_high_risk_patient() {
        let (status, body) = send(
            router(state()),
            request(
                Method::POST,
                "/api/v1/predict",
                Some(KEY),
                Some(high_risk_patient()),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patient_id"], "TEST001");
        assert_eq!(body["readmission_risk"], 0.9);
        assert_eq!(body["risk_level"], "HIGH");
        assert_eq!(body["confidence"], 0.85);
        assert_eq!(body["recommendations"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn predict_without_key_is_forbidden() {
        let (status, body) = send(
            router(state()),
            request(Method::POST, "/api/v1/predict", None, Some(high_risk_patient())),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn predict_with_unknown_key_is_forbidden() {
        let (status, _) = send(
            router(state()),
            request(
                Method::POST,
                "/api/v1/predict",
                Some("dev-key-charite"),
                Some(high_risk_patient()),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn key_check_is_exact() {
        let (status, _) = send(
            router(state()),
            request(Method::GET, "/api/v1/institutions", Some("DEV-KEY-DKFZ"), None),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn predict_missing_patient_id_is_unprocessable() {
        let mut payload = high_risk_patient();
        payload
            .as_object_mut()
            .expect("object payload")
            .remove("patient_id");

        let (status, body) = send(
            router(state()),
            request(Method::POST, "/api/v1/predict", Some(KEY), Some(payload)),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"]
            .as_str()
            .is_some_and(|detail| detail.contains("patient_id")));
    }

    #[tokio::test]
    async fn predict_negative_age_is_unprocessable() {
        let mut payload = high_risk_patient();
        payload["age"] = json!(-4);

        let (status, _) = send(
            router(state()),
            request(Method::POST, "/api/v1/predict", Some(KEY), Some(payload)),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn bad_key_wins_over_bad_body() {
        let (status, _) = send(
            router(state()),
            request(
                Method::POST,
                "/api/v1/predict",
                None,
                Some(json!({ "age": 65 })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn institutions_lists_three_partners() {
        let (status, body) = send(
            router(state()),
            request(Method::GET, "/api/v1/institutions", Some("dev-key-ukhd"), None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let listed = body["institutions"].as_array().expect("institution array");
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[1]["id"], "ukhd");
        assert_eq!(listed[1]["patient_count"], 700);
    }

    #[tokio::test]
    async fn institutions_without_key_is_forbidden() {
        let (status, _) = send(
            router(state()),
            request(Method::GET, "/api/v1/institutions", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn ingest_rejects_non_patient_resources() {
        let state = state();
        let batch = json!([
            {"resourceType": "Patient", "id": "embl-1", "gender": "male", "birthDate": "1960-01-01"},
            {"resourceType": "Observation", "id": "obs-1", "gender": "male", "birthDate": "1960-01-01"},
            {"resourceType": "Patient", "id": "embl-2", "gender": "female", "birthDate": "1962-02-02"},
        ]);

        let (status, body) = send(
            router(state.clone()),
            request(Method::POST, "/api/v1/data/ingest", Some(KEY), Some(batch)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], 2);
        assert_eq!(body["rejected"], 1);
        let errors = body["errors"].as_array().expect("errors array");
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .as_str()
            .is_some_and(|error| error.ends_with("must be 'Patient'")));
        assert_eq!(state.records.count().expect("count"), 2);
    }

    #[tokio::test]
    async fn ingest_single_observation() {
        let batch = json!([
            {"resourceType": "Observation", "id": "obs-9", "gender": "female", "birthDate": "1980-01-01"},
        ]);

        let (status, body) = send(
            router(state()),
            request(Method::POST, "/api/v1/data/ingest", Some(KEY), Some(batch)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], 0);
        assert_eq!(body["rejected"], 1);
    }

    #[tokio::test]
    async fn ingest_requires_key() {
        let (status, _) = send(
            router(state()),
            request(Method::POST, "/api/v1/data/ingest", None, Some(json!([]))),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
