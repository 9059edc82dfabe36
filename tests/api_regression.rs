//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and
//! exercise the ingest and read endpoints using
//! `tower::ServiceExt::oneshot()`. No binary spawn, no network port.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use seiscat::api::{create_app, ApiState};
use seiscat::catalog::{CatalogStore, InMemoryCatalog};
use seiscat::config::ObjectStoreSettings;
use seiscat::pipeline::{ProcessingPipeline, RealtimeQueue};
use seiscat::storage::{ObjectStorageClient, WaveformStorage};
use seiscat::streaming::{InMemoryMessageBus, WaveformStreamPublisher, WaveformStreamTopics};

struct TestHarness {
    state: ApiState,
    _tmp: tempfile::TempDir,
}

fn create_test_state() -> TestHarness {
    let tmp = tempfile::tempdir().unwrap();
    let object_store = ObjectStorageClient::new(&ObjectStoreSettings {
        bucket: "seismic-waveforms".to_string(),
        cache_dir: tmp.path().join("cache"),
        endpoint: None,
        scheme: "s3".to_string(),
    })
    .unwrap();
    let storage = Arc::new(
        WaveformStorage::new(tmp.path().join("data"), object_store).unwrap(),
    );
    let bus = Arc::new(InMemoryMessageBus::new());
    let publisher = Arc::new(WaveformStreamPublisher::new(
        bus,
        WaveformStreamTopics::default(),
    ));
    let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalog::new());
    let queue = Arc::new(RealtimeQueue::new(
        Arc::new(ProcessingPipeline::with_default_estimators()),
        16,
        Some(seiscat::catalog::completion_sink(Arc::clone(&catalog))),
    ));

    TestHarness {
        state: ApiState {
            queue,
            publisher,
            storage,
            catalog,
        },
        _tmp: tmp,
    }
}

fn ingest_body() -> String {
    serde_json::json!({
        "station_code": "TEST",
        "network": "NC",
        "start_time": "2024-01-01T00:00:00Z",
        "end_time": "2024-01-01T00:00:01Z",
        "samples": vec![0.1f32; 100],
        "sampling_rate": 100.0,
        "metadata": HashMap::<String, serde_json::Value>::new(),
    })
    .to_string()
}

#[tokio::test]
async fn health_returns_ok() {
    let harness = create_test_state();
    let app = create_app(harness.state);
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn ingest_returns_accepted_with_placement() {
    let harness = create_test_state();
    harness.state.queue.start().await;
    let app = create_app(harness.state.clone());

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/waveforms/ingest")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(ingest_body()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(value["waveform_file_id"].as_str().is_some());
    assert!(value["file_path"]
        .as_str()
        .unwrap()
        .ends_with("TEST_000000.bin"));
    assert!(value["queue_position"].as_u64().is_some());

    harness.state.queue.stop().await;
}

#[tokio::test]
async fn ingested_waveform_eventually_appears_in_events() {
    let harness = create_test_state();
    harness.state.queue.start().await;

    let app = create_app(harness.state.clone());
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/waveforms/ingest")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(ingest_body()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    // Pipeline runs in the background; poll the read endpoint.
    let mut events = serde_json::Value::Null;
    for _ in 0..200 {
        let resp = create_app(harness.state.clone())
            .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        events = serde_json::from_slice(&body).unwrap();
        if events.as_array().is_some_and(|list| !list.is_empty()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    harness.state.queue.stop().await;

    let list = events.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["station_code"], "TEST");
    assert_eq!(list[0]["processing_status"], "pending");
}
