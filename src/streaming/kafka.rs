//! Kafka-backed message bus for production deployments.
//!
//! Durable and partitioned; placement metadata comes from the broker's
//! acknowledgement. Each subscription runs as an independent long-lived
//! consumption task, decoupled from publish timing. Per-message decode
//! failures are logged and skipped so one poison message never blocks a
//! partition; connection and authentication failures at `start()` and
//! `subscribe()` are fatal to that call.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::Message;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::message_bus::{BusError, MessageBus, MessageHandler, PublishResult};
use crate::config::KafkaSettings;

/// Consumer group used when a subscription does not name one.
const DEFAULT_GROUP_ID: &str = "catalog-consumer";

/// Kafka transport implementing the [`MessageBus`] contract.
pub struct KafkaMessageBus {
    settings: KafkaSettings,
    producer: Mutex<Option<FutureProducer>>,
    consumer_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl KafkaMessageBus {
    pub fn new(settings: KafkaSettings) -> Self {
        Self {
            settings,
            producer: Mutex::new(None),
            consumer_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Shared client configuration; `group_id` switches consumer settings on.
    fn client_config(&self, group_id: Option<&str>) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", self.settings.bootstrap_servers.as_str());
        if let Some(protocol) = &self.settings.security_protocol {
            config.set("security.protocol", protocol.as_str());
        }
        if let Some(mechanism) = &self.settings.sasl_mechanism {
            config.set("sasl.mechanism", mechanism.as_str());
        }
        if let Some(username) = &self.settings.sasl_username {
            config.set("sasl.username", username.as_str());
        }
        if let Some(password) = &self.settings.sasl_password {
            config.set("sasl.password", password.as_str());
        }
        if let Some(group) = group_id {
            config.set("group.id", group);
            config.set("enable.auto.commit", "false");
            config.set("auto.offset.reset", "latest");
        }
        config
    }
}

#[async_trait]
impl MessageBus for KafkaMessageBus {
    /// Create the producer. Misconfiguration fails here, not at first
    /// publish — missing or wrong connection parameters must never be
    /// silently ignored.
    async fn start(&self) -> Result<(), BusError> {
        let mut producer = self.producer.lock().await;
        if producer.is_some() {
            return Ok(());
        }
        let created: FutureProducer = self
            .client_config(None)
            .create()
            .map_err(|e| BusError::Transport(e.to_string()))?;
        *producer = Some(created);
        info!(
            bootstrap_servers = %self.settings.bootstrap_servers,
            "Kafka producer started"
        );
        Ok(())
    }

    /// Drops the producer and aborts every consumption task. Subscription
    /// loops carry no per-message completion promise, so cancellation is
    /// not graceful.
    async fn stop(&self) -> Result<(), BusError> {
        self.producer.lock().await.take();
        let mut tasks = self.consumer_tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        value: Value,
    ) -> Result<PublishResult, BusError> {
        self.start().await?;
        let producer = self.producer.lock().await;
        let producer = producer
            .as_ref()
            .ok_or_else(|| BusError::NotConfigured("kafka producer missing".to_string()))?;

        let payload = serde_json::to_vec(&value)?;
        let mut record: FutureRecord<'_, str, Vec<u8>> =
            FutureRecord::to(topic).payload(&payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        let (partition, offset) = producer
            .send(record, Timeout::Never)
            .await
            .map_err(|(e, _)| BusError::Transport(e.to_string()))?;

        Ok(PublishResult {
            topic: topic.to_string(),
            partition: Some(partition),
            offset: Some(offset),
            headers: None,
        })
    }

    async fn subscribe(
        &self,
        topic: &str,
        handler: MessageHandler,
        group_id: Option<&str>,
    ) -> Result<(), BusError> {
        let consumer: StreamConsumer = self
            .client_config(Some(group_id.unwrap_or(DEFAULT_GROUP_ID)))
            .create()
            .map_err(|e| BusError::Transport(e.to_string()))?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| BusError::Transport(e.to_string()))?;

        let topic_name = topic.to_string();
        let task = tokio::spawn(async move {
            loop {
                let payload = match consumer.recv().await {
                    Ok(message) => message.payload().map(<[u8]>::to_vec),
                    Err(e) => {
                        warn!(topic = %topic_name, error = %e, "Kafka consume error");
                        continue;
                    }
                };
                let Some(payload) = payload else {
                    continue;
                };
                match serde_json::from_slice::<Value>(&payload) {
                    Ok(value) => handler(value).await,
                    Err(e) => {
                        // Skip, don't retry: a poison message must not
                        // block the partition.
                        warn!(
                            topic = %topic_name,
                            error = %e,
                            "Skipping undecodable message"
                        );
                    }
                }
            }
        });
        self.consumer_tasks.lock().await.push(task);
        Ok(())
    }
}
