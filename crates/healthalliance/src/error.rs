use crate::access::AccessDenied;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::ingestion::StoreError;
use crate::workflows::readmission::{FeatureError, PredictionError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Metrics(Box<dyn std::error::Error + Send + Sync>),
    Features(FeatureError),
    Storage(StoreError),
    Unauthorized(AccessDenied),
    InvalidRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Metrics(err) => write!(f, "metrics error: {}", err),
            AppError::Features(err) => write!(f, "feature extraction error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Unauthorized(_) => write!(f, "Invalid or missing API key"),
            AppError::InvalidRequest(detail) => write!(f, "{}", detail),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Metrics(err) => Some(&**err),
            AppError::Features(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Unauthorized(err) => Some(err),
            AppError::InvalidRequest(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Features(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Metrics(_)
            | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<FeatureError> for AppError {
    fn from(value: FeatureError) -> Self {
        Self::Features(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<AccessDenied> for AppError {
    fn from(value: AccessDenied) -> Self {
        Self::Unauthorized(value)
    }
}

impl From<PredictionError> for AppError {
    fn from(value: PredictionError) -> Self {
        match value {
            PredictionError::Unauthorized(denied) => Self::Unauthorized(denied),
        }
    }
}
