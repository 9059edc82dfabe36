//! seiscat — realtime seismic waveform ingestion and catalog processing.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults (in-process bus, ./data staging)
//! cargo run --release
//!
//! # Run against a specific config file
//! cargo run --release -- --config deploy/seiscat.toml
//!
//! # Override the bind address
//! cargo run --release -- --addr 127.0.0.1:9000
//! ```
//!
//! # Environment Variables
//!
//! - `SEISCAT_CONFIG`: Path to the TOML config file
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use seiscat::api::{create_app, ApiState};
use seiscat::catalog::{self, CatalogStore, InMemoryCatalog};
use seiscat::config::Settings;
use seiscat::pipeline::{ProcessingPipeline, RealtimeQueue};
use seiscat::storage::{ObjectStorageClient, WaveformStorage};
use seiscat::streaming::{build_message_bus, WaveformStreamPublisher, WaveformStreamTopics};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "seiscat")]
#[command(about = "Realtime seismic waveform ingestion and catalog processing")]
#[command(version)]
struct CliArgs {
    /// Path to the TOML config file (overrides SEISCAT_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the server bind address (default from config)
    #[arg(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let settings = match &args.config {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::load(),
    };
    let addr = args.addr.unwrap_or_else(|| settings.server.addr.clone());

    // Storage collaborators
    let object_store = ObjectStorageClient::new(&settings.storage.object_store)
        .context("Failed to initialize object store cache")?;
    let storage = Arc::new(
        WaveformStorage::new(settings.storage.data_root.clone(), object_store)
            .context("Failed to initialize waveform storage")?,
    );

    // Streaming bus — fail fast on bad distributed configuration.
    let bus = build_message_bus(&settings.streaming);
    bus.start().await.context("Failed to start message bus")?;
    let publisher = Arc::new(WaveformStreamPublisher::new(
        Arc::clone(&bus),
        WaveformStreamTopics::from(&settings.streaming.topics),
    ));

    // Catalog persistence behind the completion sink
    let catalog_store: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalog::new());

    // Realtime pipeline
    let pipeline = Arc::new(ProcessingPipeline::with_default_estimators());
    let queue = Arc::new(RealtimeQueue::new(
        pipeline,
        settings.queue.capacity,
        Some(catalog::completion_sink(Arc::clone(&catalog_store))),
    ));
    queue.start().await;

    // HTTP layer
    let state = ApiState {
        queue: Arc::clone(&queue),
        publisher,
        storage,
        catalog: catalog_store,
    };
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "seiscat listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Ordered teardown: stop accepting pipeline work, then the bus.
    queue.stop().await;
    bus.stop().await.context("Failed to stop message bus")?;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
        return;
    }
    info!("Shutdown signal received");
}
