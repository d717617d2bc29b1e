//! HTTP surface exposed by the agent: health, Prometheus metrics, and a
//! thin ingest endpoint that stands in for the collector interface spec §1
//! treats as an external, out-of-scope collaborator. Collectors that can't
//! embed the dispatcher directly call `Handle` through this instead.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use logwarden_core::Dispatcher;
use logwarden_model::{Labels, LogMessage, SourceType};
use serde::Deserialize;

use crate::metrics::MetricsRegistry;

pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: MetricsRegistry,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/v1/entries", post(ingest))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.dispatcher.is_running() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not running")
    }
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics.update(&state.dispatcher.stats());
    match state.metrics.encode() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
struct IngestRequest {
    source_type: IngestSourceType,
    source_id: String,
    message: String,
    #[serde(default)]
    labels: Labels,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum IngestSourceType {
    Container,
    File,
    Other,
}

impl From<IngestSourceType> for SourceType {
    fn from(value: IngestSourceType) -> Self {
        match value {
            IngestSourceType::Container => SourceType::Container,
            IngestSourceType::File => SourceType::File,
            IngestSourceType::Other => SourceType::Other,
        }
    }
}

async fn ingest(State(state): State<Arc<AppState>>, Json(req): Json<IngestRequest>) -> impl IntoResponse {
    let result = state.dispatcher.handle(
        req.source_type.into(),
        req.source_id,
        LogMessage::from(req.message),
        req.labels,
    );

    match result {
        Ok(()) => StatusCode::ACCEPTED,
        Err(err) => {
            tracing::debug!(error = %err, "entry rejected at admission");
            match err {
                logwarden_core::DispatchError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                logwarden_core::DispatchError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
                logwarden_core::DispatchError::NotRunning | logwarden_core::DispatchError::ContextCancelled => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                logwarden_core::DispatchError::Processing(_) => StatusCode::BAD_REQUEST,
            }
        }
    }
}
