//! Realtime Processing Pipeline
//!
//! ```text
//! ingest → [Stream Publisher] → RealtimeQueue.submit
//!                                     │ (bounded FIFO, backpressure)
//!                                     ▼
//!                               worker task
//!                                     │
//!                                     ▼
//!                            ProcessingPipeline
//!                 phase picking → association → location
//!                                             → magnitude
//!                                             → mechanism
//!                                     │
//!                                     ▼
//!                              completion sink
//! ```
//!
//! Phase picking and association are hard-stop stages; location, magnitude
//! and mechanism are best-effort. All stage failures are recorded on the
//! context, never raised to the caller.

pub mod context;
pub mod orchestrator;
pub mod queue;

pub use context::{
    AssociationResult, PhasePickResult, PipelineStage, ProcessingContext, StageError,
    WaveformPayload,
};
pub use orchestrator::ProcessingPipeline;
pub use queue::{CompletionSink, QueueError, RealtimeQueue};
