//! REST API module using Axum.
//!
//! Thin ingest and read endpoints in front of the realtime pipeline:
//!
//! - `POST /waveforms/ingest` — store, publish, and queue a waveform
//! - `GET /events` — recent catalog events
//! - `GET /health` — liveness probe
//!
//! Pipeline errors are never surfaced here; ingestion callers observe
//! either an accepted-with-placement response or a backpressure delay.

pub mod handlers;

pub use handlers::{ApiState, WaveformIngestRequest, WaveformIngestResponse};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::pipeline::QueueError;
use crate::storage::StorageError;

/// Build the application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/waveforms/ingest", post(handlers::ingest_waveform))
        .route("/events", get(handlers::list_events))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Errors surfaced by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Catalog(#[from] crate::catalog::CatalogError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            // A closed queue means shutdown is in progress.
            Self::Queue(QueueError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) | Self::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(error = %self, "Request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
