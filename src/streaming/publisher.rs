//! Stream Publisher — announces ingested waveforms on the raw topic.
//!
//! The bus payload is metadata-only: sample count and storage placement,
//! never the raw samples. Consumers needing the waveform itself follow
//! the object URI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::message_bus::{BusError, MessageBus, PublishResult};
use crate::config::TopicSettings;
use crate::pipeline::WaveformPayload;

/// Topic names used throughout the streaming pipeline.
#[derive(Debug, Clone)]
pub struct WaveformStreamTopics {
    pub raw_waveforms: String,
    pub phase_picks: String,
    pub associations: String,
    pub locations: String,
}

impl Default for WaveformStreamTopics {
    fn default() -> Self {
        Self::from(&TopicSettings::default())
    }
}

impl From<&TopicSettings> for WaveformStreamTopics {
    fn from(settings: &TopicSettings) -> Self {
        Self {
            raw_waveforms: settings.raw_waveforms.clone(),
            phase_picks: settings.phase_picks.clone(),
            associations: settings.associations.clone(),
            locations: settings.locations.clone(),
        }
    }
}

/// Canonical wire record for the raw-waveform topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformStreamRecord {
    pub station_code: String,
    pub network: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub sampling_rate: f64,
    pub sample_count: usize,
    pub window_seconds: f64,
    pub object_uri: Option<String>,
    pub object_key: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub ingested_at: DateTime<Utc>,
}

/// Publishes waveform metadata into the realtime streaming bus.
pub struct WaveformStreamPublisher {
    bus: Arc<dyn MessageBus>,
    topics: WaveformStreamTopics,
}

impl WaveformStreamPublisher {
    pub fn new(bus: Arc<dyn MessageBus>, topics: WaveformStreamTopics) -> Self {
        Self { bus, topics }
    }

    pub fn topics(&self) -> &WaveformStreamTopics {
        &self.topics
    }

    /// Publish the canonical record for `payload` to the raw-waveform
    /// topic and return the bus placement.
    ///
    /// Does not mutate the payload — the caller applies the returned
    /// placement to the payload's stream fields.
    pub async fn publish_waveform(
        &self,
        payload: &WaveformPayload,
    ) -> Result<PublishResult, BusError> {
        let record = Self::build_record(payload);
        let key = ordering_key(payload);
        let value = serde_json::to_value(&record)?;
        self.bus
            .publish(&self.topics.raw_waveforms, Some(&key), value)
            .await
    }

    fn build_record(payload: &WaveformPayload) -> WaveformStreamRecord {
        WaveformStreamRecord {
            station_code: payload.station_code.clone(),
            network: payload.network.clone(),
            start_time: payload.start_time,
            end_time: payload.end_time,
            sampling_rate: payload.sampling_rate,
            sample_count: payload.samples.len(),
            window_seconds: payload.window_seconds(),
            object_uri: payload.object_uri.clone(),
            object_key: payload.storage_key.clone(),
            metadata: payload.metadata.clone(),
            ingested_at: Utc::now(),
        }
    }
}

/// Partition/ordering key: all records for the same station window land on
/// one key.
pub fn ordering_key(payload: &WaveformPayload) -> String {
    format!(
        "{}:{}:{}",
        payload.network.as_deref().unwrap_or("NA"),
        payload.station_code,
        payload.start_time.to_rfc3339()
    )
}

// ============================================================================
// Tests
// ============================================================================
