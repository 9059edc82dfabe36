//! API route handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::ApiError;
use crate::catalog::{CatalogEvent, CatalogStore};
use crate::pipeline::{ProcessingContext, RealtimeQueue, WaveformPayload};
use crate::storage::WaveformStorage;
use crate::streaming::WaveformStreamPublisher;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub queue: Arc<RealtimeQueue>,
    pub publisher: Arc<WaveformStreamPublisher>,
    pub storage: Arc<WaveformStorage>,
    pub catalog: Arc<dyn CatalogStore>,
}

// ============================================================================
// Request / Response Bodies
// ============================================================================

/// Body of `POST /waveforms/ingest`.
#[derive(Debug, Deserialize)]
pub struct WaveformIngestRequest {
    pub station_code: String,
    pub network: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub samples: Vec<f32>,
    pub sampling_rate: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Accepted-with-placement response.
#[derive(Debug, Serialize)]
pub struct WaveformIngestResponse {
    pub waveform_file_id: uuid::Uuid,
    pub file_path: String,
    pub queue_position: usize,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default = "default_events_limit")]
    pub limit: usize,
}

fn default_events_limit() -> usize {
    100
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Ingest one waveform record: stage it to storage, announce it on the
/// raw topic, and queue it for pipeline processing.
///
/// Returns 202 as soon as the context is queued; pipeline outcomes are
/// visible only through the catalog and the bus, never here.
pub async fn ingest_waveform(
    State(state): State<ApiState>,
    Json(request): Json<WaveformIngestRequest>,
) -> Result<(StatusCode, Json<WaveformIngestResponse>), ApiError> {
    let mut payload = WaveformPayload::new(
        request.station_code,
        request.network,
        request.start_time,
        request.end_time,
        request.samples,
        request.sampling_rate,
        request.metadata,
    );

    let stored = state.storage.store_waveform(&mut payload)?;

    // Announce on the raw-waveform topic. A bus failure is logged, not
    // fatal — ingestion must keep accepting data when the bus degrades.
    match state.publisher.publish_waveform(&payload).await {
        Ok(placement) => {
            payload.stream_partition = placement.partition;
            payload.stream_offset = placement.offset;
        }
        Err(e) => {
            warn!(station = %payload.station_code, error = %e, "Waveform publish failed");
        }
    }

    state.queue.submit(ProcessingContext::new(payload)).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(WaveformIngestResponse {
            waveform_file_id: stored.id,
            file_path: stored.file_path.display().to_string(),
            queue_position: state.queue.len(),
        }),
    ))
}

/// Recent catalog events, most recent first.
pub async fn list_events(
    State(state): State<ApiState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<CatalogEvent>>, ApiError> {
    let events = state.catalog.list_events(query.limit)?;
    Ok(Json(events))
}
