//! Streaming bus integration for the realtime pipeline.
//!
//! Pipeline inputs and stage outputs are announced on named topics through
//! the [`MessageBus`] capability trait. Two interchangeable transports:
//!
//! - [`InMemoryMessageBus`] — single-process fan-out for development and
//!   testing; publish is a synchronization point.
//! - [`KafkaMessageBus`] — durable, partitioned, broker-backed transport
//!   for production deployments.
//!
//! Callers hold `Arc<dyn MessageBus>` and never depend on a concrete
//! variant; [`build_message_bus`] constructs the one selected in config.

pub mod kafka;
pub mod message_bus;
pub mod publisher;

pub use kafka::KafkaMessageBus;
pub use message_bus::{
    handler_fn, BusError, InMemoryMessageBus, MessageBus, MessageHandler, PublishResult,
};
pub use publisher::{WaveformStreamPublisher, WaveformStreamRecord, WaveformStreamTopics};

use crate::config::{StreamingDriver, StreamingSettings};
use std::sync::Arc;

/// Construct the message bus selected by configuration.
///
/// Kafka connection problems surface later, at `start()` — fail fast, no
/// silent fallback to the in-process bus.
pub fn build_message_bus(settings: &StreamingSettings) -> Arc<dyn MessageBus> {
    match settings.driver {
        StreamingDriver::InMemory => Arc::new(InMemoryMessageBus::new()),
        StreamingDriver::Kafka => Arc::new(KafkaMessageBus::new(settings.kafka.clone())),
    }
}
