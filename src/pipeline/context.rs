//! Per-item pipeline state.
//!
//! A [`WaveformPayload`] is created once at ingestion and exclusively owned
//! by its [`ProcessingContext`] for the lifetime of one pipeline run. The
//! context accumulates stage results in pipeline order plus any stage
//! failures, and is handed to the completion sink when the run finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::processing::{
    AssociationCandidate, LocationEstimate, MagnitudeEstimate, MechanismEstimate, PhaseDetection,
};

// ============================================================================
// Waveform Payload
// ============================================================================

/// Container for waveform data traveling through the processing pipeline.
///
/// Immutable after ingestion except for the placement fields, which are
/// write-once: storage placement is filled by the waveform store, stream
/// placement by the ingest path after publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformPayload {
    pub station_code: String,
    pub network: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub samples: Vec<f32>,
    pub sampling_rate: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    // Storage placement, assigned by the waveform store
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub object_uri: Option<String>,
    #[serde(default)]
    pub storage_key: Option<String>,

    // Stream placement, assigned after publication to the raw topic
    #[serde(default)]
    pub stream_partition: Option<i32>,
    #[serde(default)]
    pub stream_offset: Option<i64>,
}

impl WaveformPayload {
    /// Create a payload fresh from an ingest request, with no placement.
    pub fn new(
        station_code: impl Into<String>,
        network: Option<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        samples: Vec<f32>,
        sampling_rate: f64,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            station_code: station_code.into(),
            network,
            start_time,
            end_time,
            samples,
            sampling_rate,
            metadata,
            file_path: None,
            object_uri: None,
            storage_key: None,
            stream_partition: None,
            stream_offset: None,
        }
    }

    /// Duration of the waveform window in seconds.
    pub fn window_seconds(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

// ============================================================================
// Stage Identity & Errors
// ============================================================================

/// The five estimator stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    PhasePicking,
    Association,
    Location,
    Magnitude,
    Mechanism,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhasePicking => "phase_picking",
            Self::Association => "association",
            Self::Location => "location",
            Self::Magnitude => "magnitude",
            Self::Mechanism => "mechanism",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage failure recorded on the context, tagged with its origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: PipelineStage,
    pub message: String,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

// ============================================================================
// Stage Result Slots
// ============================================================================

/// Picks produced by the phase picking stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasePickResult {
    pub picks: Vec<PhaseDetection>,
}

/// Candidate events produced by the association stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationResult {
    pub candidate_events: Vec<AssociationCandidate>,
}

// ============================================================================
// Processing Context
// ============================================================================

/// State object passed through the processing pipeline.
///
/// Result slots are populated strictly in pipeline order; a slot is set
/// only when its stage succeeds with a non-empty result. Created per
/// ingested waveform, owned by one pipeline run, discarded after the
/// completion sink returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingContext {
    pub waveform: WaveformPayload,
    pub phase_picks: Option<PhasePickResult>,
    pub association: Option<AssociationResult>,
    pub location: Option<LocationEstimate>,
    pub magnitude: Option<MagnitudeEstimate>,
    pub mechanism: Option<MechanismEstimate>,
    pub errors: Vec<StageError>,
}

impl ProcessingContext {
    pub fn new(waveform: WaveformPayload) -> Self {
        Self {
            waveform,
            phase_picks: None,
            association: None,
            location: None,
            magnitude: None,
            mechanism: None,
            errors: Vec::new(),
        }
    }

    /// Record a stage failure without interrupting the pipeline.
    pub fn record_error(&mut self, stage: PipelineStage, message: impl ToString) {
        self.errors.push(StageError {
            stage,
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Current picks as a slice; empty when the stage produced nothing.
    pub fn picks(&self) -> &[PhaseDetection] {
        self.phase_picks
            .as_ref()
            .map_or(&[], |result| result.picks.as_slice())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_payload() -> WaveformPayload {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        WaveformPayload::new(
            "TEST",
            Some("NC".to_string()),
            start,
            start + chrono::Duration::seconds(1),
            vec![0.0; 100],
            100.0,
            HashMap::new(),
        )
    }

    #[test]
    fn window_seconds_from_timestamps() {
        let payload = test_payload();
        assert!((payload.window_seconds() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stage_errors_render_with_stage_prefix() {
        let mut context = ProcessingContext::new(test_payload());
        context.record_error(PipelineStage::Location, "solver diverged");
        assert_eq!(context.errors.len(), 1);
        assert_eq!(context.errors[0].to_string(), "location: solver diverged");
    }

    #[test]
    fn fresh_context_has_no_results() {
        let context = ProcessingContext::new(test_payload());
        assert!(context.phase_picks.is_none());
        assert!(context.association.is_none());
        assert!(context.location.is_none());
        assert!(context.magnitude.is_none());
        assert!(context.mechanism.is_none());
        assert!(!context.has_errors());
        assert!(context.picks().is_empty());
    }
}
