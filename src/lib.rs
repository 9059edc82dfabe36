//! seiscat — realtime seismic waveform ingestion and catalog processing.
//!
//! ## Architecture
//!
//! - **Realtime Queue**: bounded admission control between ingestion and
//!   pipeline execution, one background worker
//! - **Pipeline Orchestrator**: phase picking → association → location →
//!   magnitude → mechanism, with a two-tier failure policy
//! - **Message Bus**: pluggable publish/subscribe transport (in-process
//!   or Kafka) announcing pipeline inputs and outputs as topics
//! - **Stream Publisher**: canonical metadata records on the raw topic
//! - **Storage / Catalog**: thin collaborators for waveform staging and
//!   event-row persistence

pub mod api;
pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod processing;
pub mod storage;
pub mod streaming;

// Re-export configuration
pub use config::Settings;

// Re-export commonly used pipeline types
pub use pipeline::{
    CompletionSink, PipelineStage, ProcessingContext, ProcessingPipeline, QueueError,
    RealtimeQueue, StageError, WaveformPayload,
};

// Re-export streaming surface
pub use streaming::{
    build_message_bus, BusError, InMemoryMessageBus, KafkaMessageBus, MessageBus, PublishResult,
    WaveformStreamPublisher, WaveformStreamTopics,
};

// Re-export storage collaborators
pub use storage::{ObjectStorageClient, StorageError, WaveformFile, WaveformStorage};

// Re-export catalog collaborators
pub use catalog::{CatalogEvent, CatalogStore, InMemoryCatalog, ProcessingStatus};
