use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryPatientStore};
use crate::metrics::{self, MetricsPredictionRecorder};
use crate::routes::router;
use healthalliance::config::AppConfig;
use healthalliance::error::AppError;
use healthalliance::telemetry;
use healthalliance::workflows::readmission::PredictionService;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(port) = args.metrics_port.take() {
        config.metrics.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let prometheus_handle =
        metrics::install_recorder().map_err(|err| AppError::Metrics(Box::new(err)))?;
    let metrics_addr = config.metrics.socket_addr(&config.server.host)?;
    metrics::spawn_listener(metrics_addr, prometheus_handle);

    let allowlist = config.access.allowlist();
    if allowlist.is_empty() {
        warn!("API_KEYS is empty; every protected request will be rejected");
    }

    let app_state = AppState {
        predictions: Arc::new(PredictionService::new(
            allowlist,
            Arc::new(MetricsPredictionRecorder),
        )),
        records: Arc::new(InMemoryPatientStore::default()),
    };
    let keys = app_state.predictions.gate().len();

    let app = router(app_state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(?config.environment, %addr, %metrics_addr, keys, "readmission risk service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
