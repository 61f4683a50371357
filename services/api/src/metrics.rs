use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use healthalliance::workflows::readmission::{PredictionEvent, PredictionRecorder};
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Gauge,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;
use tracing::{error, info};

pub(crate) const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub(crate) const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub(crate) const ACTIVE_CONNECTIONS: &str = "active_connections";
pub(crate) const PREDICTIONS_TOTAL: &str = "predictions_total";
pub(crate) const PREDICTION_DURATION_SECONDS: &str = "prediction_duration_seconds";
pub(crate) const MODEL_CONFIDENCE_SCORE: &str = "model_confidence_score";

const REQUEST_BUCKETS: [f64; 8] = [0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0];
const PREDICTION_BUCKETS: [f64; 7] = [0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0];
const CONFIDENCE_BUCKETS: [f64; 10] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Endpoint label for requests that matched no route.
const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Install the global Prometheus recorder. Must run once per process.
pub(crate) fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = builder()?.install_recorder()?;
    describe();
    Ok(handle)
}

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
            &REQUEST_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(PREDICTION_DURATION_SECONDS.to_string()),
            &PREDICTION_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(MODEL_CONFIDENCE_SCORE.to_string()),
            &CONFIDENCE_BUCKETS,
        )
}

fn describe() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        ACTIVE_CONNECTIONS,
        "Number of currently active HTTP connections"
    );
    describe_counter!(PREDICTIONS_TOTAL, "Total number of prediction requests");
    describe_histogram!(
        PREDICTION_DURATION_SECONDS,
        "Time taken to compute a prediction"
    );
    describe_histogram!(
        MODEL_CONFIDENCE_SCORE,
        "Distribution of model confidence scores"
    );
}

/// Holds one unit of `active_connections` until dropped, including when the
/// request future is cancelled.
struct InFlight(Gauge);

impl InFlight {
    fn enter() -> Self {
        let gauge = gauge!(ACTIVE_CONNECTIONS);
        gauge.increment(1.0);
        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.decrement(1.0);
    }
}

/// Request counter, latency histogram and in-flight gauge for every route.
pub(crate) async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string());

    let in_flight = InFlight::enter();
    let started = Instant::now();

    let response = next.run(request).await;

    drop(in_flight);
    let status = response.status().as_u16().to_string();
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "endpoint" => endpoint.clone(),
        "status" => status
    )
    .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method,
        "endpoint" => endpoint
    )
    .record(started.elapsed().as_secs_f64());

    response
}

/// Forwards prediction events to the global metrics registry.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct MetricsPredictionRecorder;

impl PredictionRecorder for MetricsPredictionRecorder {
    fn record(&self, event: &PredictionEvent) {
        counter!(
            PREDICTIONS_TOTAL,
            "status" => "success",
            "risk_level" => event.tier.label()
        )
        .increment(1);
        histogram!(PREDICTION_DURATION_SECONDS).record(event.elapsed.as_secs_f64());
        histogram!(MODEL_CONFIDENCE_SCORE).record(event.confidence);
    }
}

/// Start the scrape listener. It lives for the rest of the process and only
/// shares the recorder handle with the API.
pub(crate) fn spawn_listener(addr: SocketAddr, handle: PrometheusHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let app = Router::new()
            .route("/metrics", get(metrics_endpoint))
            .with_state(handle);

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!(%addr, error = %err, "metrics listener failed to bind");
                return;
            }
        };

        info!(%addr, "metrics listener ready");
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "metrics listener stopped");
        }
    })
}

async fn metrics_endpoint(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}
