//! Deployment configuration loaded from TOML files.
//!
//! Every tunable the pipeline needs — server bind address, storage roots,
//! streaming driver selection, queue capacity — is a field here with a
//! serde default, so a missing or partial config file still yields a
//! runnable system.
//!
//! ## Loading Order
//!
//! 1. `SEISCAT_CONFIG` environment variable (path to TOML file)
//! 2. `seiscat.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded [`Settings`] value is passed explicitly to the components
//! that need it at construction time; there is no process-wide lookup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SEISCAT_CONFIG";

/// Default config file name searched in the working directory.
pub const CONFIG_FILE_NAME: &str = "seiscat.toml";

// ============================================================================
// Top-Level Settings
// ============================================================================

/// Root configuration for a catalog deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Waveform file and object-store staging
    #[serde(default)]
    pub storage: StorageSettings,

    /// Message bus driver selection and topic names
    #[serde(default)]
    pub streaming: StreamingSettings,

    /// Realtime processing queue
    #[serde(default)]
    pub queue: QueueSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            streaming: StreamingSettings::default(),
            queue: QueueSettings::default(),
        }
    }
}

impl Settings {
    /// Load configuration using the standard search order:
    /// 1. `$SEISCAT_CONFIG` environment variable
    /// 2. `./seiscat.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(settings) => {
                        info!(path = %p.display(), "Loaded settings from SEISCAT_CONFIG");
                        return settings;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SEISCAT_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SEISCAT_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(settings) => {
                    info!(path = %local.display(), "Loaded settings from working directory");
                    return settings;
                }
                Err(e) => {
                    warn!(path = %local.display(), error = %e, "Failed to load local config, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(settings)
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address for the ingest/read API
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Waveform staging and object-store mirror configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root directory for waveform files staged before upload
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Object-store mirror settings
    #[serde(default)]
    pub object_store: ObjectStoreSettings,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            object_store: ObjectStoreSettings::default(),
        }
    }
}

/// Object storage mirror used to archive waveform files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreSettings {
    /// Bucket used to archive waveform files
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Local cache directory that mirrors object storage uploads
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Custom endpoint when not using a public cloud
    #[serde(default)]
    pub endpoint: Option<String>,

    /// URI scheme used when generating object storage links
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

fn default_bucket() -> String {
    "seismic-waveforms".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./object_store_cache")
}

fn default_scheme() -> String {
    "s3".to_string()
}

impl Default for ObjectStoreSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            cache_dir: default_cache_dir(),
            endpoint: None,
            scheme: default_scheme(),
        }
    }
}

// ============================================================================
// Streaming
// ============================================================================

/// Message bus driver selector.
///
/// Misconfigured Kafka parameters fail at `start()`; an unknown driver
/// string fails here, at deserialization — never a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingDriver {
    /// In-process bus for development and testing
    InMemory,
    /// Kafka-backed bus for production deployments
    Kafka,
}

/// Streaming bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingSettings {
    /// Which bus implementation to construct
    #[serde(default = "default_driver")]
    pub driver: StreamingDriver,

    /// Kafka connection parameters (used only when driver = "kafka")
    #[serde(default)]
    pub kafka: KafkaSettings,

    /// Topic names used throughout the streaming pipeline
    #[serde(default)]
    pub topics: TopicSettings,
}

fn default_driver() -> StreamingDriver {
    StreamingDriver::InMemory
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            kafka: KafkaSettings::default(),
            topics: TopicSettings::default(),
        }
    }
}

/// Kafka connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaSettings {
    /// Bootstrap servers for the realtime cluster
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    /// Security protocol (e.g. "SASL_SSL")
    #[serde(default)]
    pub security_protocol: Option<String>,

    /// SASL mechanism (e.g. "PLAIN")
    #[serde(default)]
    pub sasl_mechanism: Option<String>,

    /// SASL username
    #[serde(default)]
    pub sasl_username: Option<String>,

    /// SASL password
    #[serde(default)]
    pub sasl_password: Option<String>,
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

impl Default for KafkaSettings {
    fn default() -> Self {
        Self {
            bootstrap_servers: default_bootstrap_servers(),
            security_protocol: None,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
        }
    }
}

/// Topic names, configured once at startup and read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSettings {
    /// Raw waveform announcements
    #[serde(default = "default_topic_raw")]
    pub raw_waveforms: String,

    /// Phase pick stream
    #[serde(default = "default_topic_picks")]
    pub phase_picks: String,

    /// Association candidates
    #[serde(default = "default_topic_assoc")]
    pub associations: String,

    /// Location refinements
    #[serde(default = "default_topic_locations")]
    pub locations: String,
}

fn default_topic_raw() -> String {
    "waveforms.raw".to_string()
}

fn default_topic_picks() -> String {
    "waveforms.phase_picks".to_string()
}

fn default_topic_assoc() -> String {
    "waveforms.associations".to_string()
}

fn default_topic_locations() -> String {
    "waveforms.locations".to_string()
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            raw_waveforms: default_topic_raw(),
            phase_picks: default_topic_picks(),
            associations: default_topic_assoc(),
            locations: default_topic_locations(),
        }
    }
}

// ============================================================================
// Queue
// ============================================================================

/// Realtime queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Maximum in-flight backlog; `submit` blocks when reached
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

fn default_queue_capacity() -> usize {
    1000
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.server.addr, "0.0.0.0:8080");
        assert_eq!(settings.queue.capacity, 1000);
        assert_eq!(settings.streaming.driver, StreamingDriver::InMemory);
        assert_eq!(settings.streaming.topics.raw_waveforms, "waveforms.raw");
        assert_eq!(
            settings.streaming.kafka.bootstrap_servers,
            "localhost:9092"
        );
        assert_eq!(settings.storage.object_store.scheme, "s3");
    }

    #[test]
    fn partial_toml_fills_remaining_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [queue]
            capacity = 8

            [streaming]
            driver = "kafka"
            "#,
        )
        .unwrap();
        assert_eq!(settings.queue.capacity, 8);
        assert_eq!(settings.streaming.driver, StreamingDriver::Kafka);
        // Untouched sections keep their defaults.
        assert_eq!(settings.server.addr, "0.0.0.0:8080");
        assert_eq!(settings.streaming.topics.locations, "waveforms.locations");
    }

    #[test]
    fn unknown_driver_is_a_parse_error() {
        let result: Result<Settings, _> = toml::from_str(
            r#"
            [streaming]
            driver = "rabbitmq"
            "#,
        );
        assert!(result.is_err());
    }
}
