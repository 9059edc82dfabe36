//! Catalog persistence — the completion-side collaborator.
//!
//! Abstracts event-row persistence behind [`CatalogStore`] so backends can
//! be swapped without touching pipeline code. The shipped
//! [`InMemoryCatalog`] serves development, testing and minimal
//! deployments; a relational backend implements the same trait.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::pipeline::{CompletionSink, ProcessingContext};

/// Catalog persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog storage error: {0}")]
    Storage(String),
}

/// Outcome of a pipeline run as recorded in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// A hypocenter was produced with no stage failures
    Located,
    /// One or more stage failures were recorded
    Error,
    /// Processed without failures but no location was produced
    Pending,
}

/// One catalog row per finished processing context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEvent {
    pub event_time: DateTime<Utc>,
    pub station_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub depth_km: Option<f64>,
    pub location_uncertainty_km: Option<f64>,
    pub magnitude: Option<f64>,
    pub magnitude_type: Option<String>,
    pub processing_status: ProcessingStatus,
    /// Rendered stage errors, in the order they were recorded
    pub stage_errors: Vec<String>,
}

/// Trait for pluggable catalog backends.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait CatalogStore: Send + Sync {
    /// Append one event row.
    fn record_event(&self, event: CatalogEvent) -> Result<(), CatalogError>;

    /// List recent events (most recent first).
    fn list_events(&self, limit: usize) -> Result<Vec<CatalogEvent>, CatalogError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

// ============================================================================
// In-Memory Backend
// ============================================================================

/// In-memory catalog for testing and minimal deployments.
///
/// Thread-safe via `RwLock`. Not durable — rows lost on restart.
pub struct InMemoryCatalog {
    events: std::sync::RwLock<Vec<CatalogEvent>>,
    max_events: usize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            events: std::sync::RwLock::new(Vec::new()),
            max_events: 10_000,
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for InMemoryCatalog {
    fn record_event(&self, event: CatalogEvent) -> Result<(), CatalogError> {
        let mut events = self
            .events
            .write()
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        events.push(event);
        if events.len() > self.max_events {
            events.remove(0);
        }
        Ok(())
    }

    fn list_events(&self, limit: usize) -> Result<Vec<CatalogEvent>, CatalogError> {
        let events = self
            .events
            .read()
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        Ok(events.iter().rev().take(limit).cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

// ============================================================================
// Context → Row Mapping
// ============================================================================

/// Persist the outcome of one pipeline run.
pub fn persist_processing_result(
    context: &ProcessingContext,
    store: &dyn CatalogStore,
) -> Result<(), CatalogError> {
    let status = if context.has_errors() {
        ProcessingStatus::Error
    } else if context.location.is_some() {
        ProcessingStatus::Located
    } else {
        ProcessingStatus::Pending
    };

    let event = CatalogEvent {
        event_time: context.waveform.start_time,
        station_code: context.waveform.station_code.clone(),
        latitude: context.location.as_ref().map(|l| l.latitude),
        longitude: context.location.as_ref().map(|l| l.longitude),
        depth_km: context.location.as_ref().map(|l| l.depth_km),
        location_uncertainty_km: context.location.as_ref().map(|l| l.uncertainty_km),
        magnitude: context.magnitude.as_ref().map(|m| m.magnitude),
        magnitude_type: context.magnitude.as_ref().map(|m| m.magnitude_type.clone()),
        processing_status: status,
        stage_errors: context.errors.iter().map(ToString::to_string).collect(),
    };

    debug!(
        station = %event.station_code,
        status = ?event.processing_status,
        backend = store.backend_name(),
        "Persisting processing result"
    );
    store.record_event(event)
}

/// Adapt a catalog store into the queue's completion sink.
pub fn completion_sink(store: Arc<dyn CatalogStore>) -> CompletionSink {
    Arc::new(move |context: ProcessingContext| {
        let store = Arc::clone(&store);
        async move {
            persist_processing_result(&context, store.as_ref())?;
            Ok(())
        }
        .boxed()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PipelineStage, WaveformPayload};
    use crate::processing::{LocationEstimate, MagnitudeEstimate};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn test_context() -> ProcessingContext {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ProcessingContext::new(WaveformPayload::new(
            "TEST",
            Some("NC".to_string()),
            start,
            start + chrono::Duration::seconds(1),
            vec![0.0; 10],
            10.0,
            HashMap::new(),
        ))
    }

    #[test]
    fn located_context_persists_coordinates_and_magnitude() {
        let store = InMemoryCatalog::new();
        let mut context = test_context();
        context.location = Some(LocationEstimate {
            latitude: 37.5,
            longitude: -122.1,
            depth_km: 9.0,
            uncertainty_km: 1.5,
            diagnostics: HashMap::new(),
        });
        context.magnitude = Some(MagnitudeEstimate {
            magnitude: 4.1,
            magnitude_type: "ML".to_string(),
            diagnostics: HashMap::new(),
        });

        persist_processing_result(&context, &store).unwrap();

        let events = store.list_events(10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].processing_status, ProcessingStatus::Located);
        assert_eq!(events[0].latitude, Some(37.5));
        assert_eq!(events[0].magnitude, Some(4.1));
        assert_eq!(events[0].magnitude_type.as_deref(), Some("ML"));
    }

    #[test]
    fn errored_context_persists_error_status_with_messages() {
        let store = InMemoryCatalog::new();
        let mut context = test_context();
        context.record_error(PipelineStage::PhasePicking, "picker model crashed");

        persist_processing_result(&context, &store).unwrap();

        let events = store.list_events(10).unwrap();
        assert_eq!(events[0].processing_status, ProcessingStatus::Error);
        assert_eq!(
            events[0].stage_errors,
            vec!["phase_picking: picker model crashed"]
        );
    }

    #[test]
    fn clean_unlocated_context_is_pending() {
        let store = InMemoryCatalog::new();
        persist_processing_result(&test_context(), &store).unwrap();
        let events = store.list_events(10).unwrap();
        assert_eq!(events[0].processing_status, ProcessingStatus::Pending);
        assert!(events[0].stage_errors.is_empty());
    }

    #[test]
    fn list_events_is_most_recent_first() {
        let store = InMemoryCatalog::new();
        for station in ["A", "B", "C"] {
            let mut context = test_context();
            context.waveform.station_code = station.to_string();
            persist_processing_result(&context, &store).unwrap();
        }
        let events = store.list_events(2).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].station_code, "C");
        assert_eq!(events[1].station_code, "B");
    }
}
