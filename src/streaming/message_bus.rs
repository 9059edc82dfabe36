//! Message bus capability trait and the in-process implementation.

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Handler invoked once per published message on a subscribed topic.
pub type MessageHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Adapt an async closure into a [`MessageHandler`].
pub fn handler_fn<F, Fut>(f: F) -> MessageHandler
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |value| Box::pin(f(value)))
}

/// Transport-level bus errors.
///
/// Connection and authentication failures at `start()`/`subscribe()` are
/// fatal to that call; per-message decode failures during consumption are
/// logged and skipped by the transports, never surfaced here.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("bus transport error: {0}")]
    Transport(String),
    #[error("message serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("bus not configured: {0}")]
    NotConfigured(String),
}

/// Metadata returned after a message is published to the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub topic: String,
    pub partition: Option<i32>,
    /// Monotonically increasing within a partition
    pub offset: Option<i64>,
    pub headers: Option<HashMap<String, String>>,
}

/// Abstract interface for streaming message buses.
///
/// `publish` and `subscribe` auto-start a stopped bus. `start` and `stop`
/// are idempotent; `stop` releases all transport resources.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn start(&self) -> Result<(), BusError>;

    async fn stop(&self) -> Result<(), BusError>;

    /// Append `value` to `topic` under an optional partition/ordering key.
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        value: Value,
    ) -> Result<PublishResult, BusError>;

    /// Register `handler` for every message subsequently published to
    /// `topic`.
    async fn subscribe(
        &self,
        topic: &str,
        handler: MessageHandler,
        group_id: Option<&str>,
    ) -> Result<(), BusError>;
}

// ============================================================================
// In-Process Bus
// ============================================================================

/// A record retained in a topic's append-only log.
struct StoredRecord {
    key: Option<String>,
    value: Value,
}

#[derive(Default)]
struct BusState {
    started: bool,
    topics: HashMap<String, Vec<StoredRecord>>,
    subscribers: HashMap<String, Vec<MessageHandler>>,
}

/// Non-durable single-process bus for local development and testing.
///
/// Offsets are positions in the topic's in-memory list, starting at 0.
/// All subscribers of a topic run concurrently and are awaited before
/// `publish` returns, making publish a synchronization point. One lock
/// guards the whole bus instance; publish volume is far below the cost of
/// subscriber fan-out, so contention is acceptable.
pub struct InMemoryMessageBus {
    state: Mutex<BusState>,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BusState::default()),
        }
    }

    /// Number of records retained for a topic. Test/introspection helper.
    pub async fn topic_len(&self, topic: &str) -> usize {
        let state = self.state.lock().await;
        state.topics.get(topic).map_or(0, Vec::len)
    }

    /// Snapshot of a topic's retained `(key, value)` records.
    pub async fn records(&self, topic: &str) -> Vec<(Option<String>, Value)> {
        let state = self.state.lock().await;
        state.topics.get(topic).map_or_else(Vec::new, |records| {
            records
                .iter()
                .map(|record| (record.key.clone(), record.value.clone()))
                .collect()
        })
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn start(&self) -> Result<(), BusError> {
        self.state.lock().await.started = true;
        Ok(())
    }

    /// Discards all buffered topic history and registered subscribers.
    async fn stop(&self) -> Result<(), BusError> {
        let mut state = self.state.lock().await;
        state.topics.clear();
        state.subscribers.clear();
        state.started = false;
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        value: Value,
    ) -> Result<PublishResult, BusError> {
        let (offset, handlers) = {
            let mut state = self.state.lock().await;
            state.started = true;
            let records = state.topics.entry(topic.to_string()).or_default();
            records.push(StoredRecord {
                key: key.map(str::to_string),
                value: value.clone(),
            });
            let offset = (records.len() - 1) as i64;
            let handlers = state
                .subscribers
                .get(topic)
                .cloned()
                .unwrap_or_default();
            (offset, handlers)
        };

        // Fan out with the lock released: handlers may publish themselves.
        join_all(handlers.iter().map(|handler| handler(value.clone()))).await;
        debug!(topic = topic, offset = offset, "Published to in-process bus");

        Ok(PublishResult {
            topic: topic.to_string(),
            partition: Some(0),
            offset: Some(offset),
            headers: None,
        })
    }

    async fn subscribe(
        &self,
        topic: &str,
        handler: MessageHandler,
        _group_id: Option<&str>,
    ) -> Result<(), BusError> {
        let mut state = self.state.lock().await;
        state.started = true;
        state
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
