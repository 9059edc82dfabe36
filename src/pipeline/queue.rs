//! Realtime Queue — bounded admission control between ingestion and
//! pipeline execution.
//!
//! One bounded channel, one worker task. `submit` blocks the caller when
//! the queue is full (backpressure — items are never dropped and the
//! backlog never grows unbounded). The worker drains items strictly in
//! FIFO order, runs the orchestrator on each, and hands finished contexts
//! to the optional completion sink. Any panic or error escaping the
//! orchestrator or the sink is caught and logged — one bad item never
//! terminates the worker.
//!
//! `stop()` lets the in-flight item finish, then joins the worker; items
//! still queued but not yet picked up are abandoned. Callers needing a
//! full drain must stop submitting and wait for `len()` to reach zero
//! before stopping.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::context::ProcessingContext;
use super::orchestrator::ProcessingPipeline;

/// Invoked once per finished context, after orchestration completes.
pub type CompletionSink =
    Arc<dyn Fn(ProcessingContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Queue errors surfaced to submitters.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue has been stopped and accepts no further work.
    #[error("realtime queue is closed")]
    Closed,
}

/// Worker bookkeeping behind one lock: the receiver waiting to be claimed
/// by `start()`, the running task, and its cancellation token.
struct WorkerState {
    receiver: Option<mpsc::Receiver<ProcessingContext>>,
    task: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

/// Bounded FIFO queue that drives waveform processing in the background.
pub struct RealtimeQueue {
    pipeline: Arc<ProcessingPipeline>,
    sender: mpsc::Sender<ProcessingContext>,
    worker: Mutex<WorkerState>,
    on_complete: Option<CompletionSink>,
    capacity: usize,
}

impl RealtimeQueue {
    /// Create a queue with the given backlog capacity.
    pub fn new(
        pipeline: Arc<ProcessingPipeline>,
        capacity: usize,
        on_complete: Option<CompletionSink>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            pipeline,
            sender,
            worker: Mutex::new(WorkerState {
                receiver: Some(receiver),
                task: None,
                cancel: CancellationToken::new(),
            }),
            on_complete,
            capacity: capacity.max(1),
        }
    }

    /// Enqueue a context for processing.
    ///
    /// Awaits while the queue is at capacity — this is the system's
    /// admission-control mechanism, not an error. Fails only after the
    /// queue has been stopped.
    pub async fn submit(&self, context: ProcessingContext) -> Result<(), QueueError> {
        self.sender
            .send(context)
            .await
            .map_err(|_| QueueError::Closed)
    }

    /// Launch the worker if none is running. Idempotent.
    pub async fn start(&self) {
        let mut worker = self.worker.lock().await;
        if worker.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        let Some(receiver) = worker.receiver.take() else {
            warn!("Realtime queue already stopped; not restarting");
            return;
        };

        let cancel = worker.cancel.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let on_complete = self.on_complete.clone();
        worker.task = Some(tokio::spawn(worker_loop(
            receiver,
            cancel,
            pipeline,
            on_complete,
        )));
        info!(capacity = self.capacity, "Realtime queue worker started");
    }

    /// Signal the worker to exit after the in-flight item and wait for it.
    ///
    /// Safe to call more than once. Queued-but-unclaimed items are
    /// abandoned.
    pub async fn stop(&self) {
        let task = {
            let mut worker = self.worker.lock().await;
            worker.cancel.cancel();
            worker.task.take()
        };
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "Realtime queue worker task failed on shutdown");
            }
        }
    }

    /// Number of items currently queued (not counting the in-flight item).
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured backlog bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The single worker: dequeue → orchestrate → completion sink, with
/// per-item isolation.
async fn worker_loop(
    mut receiver: mpsc::Receiver<ProcessingContext>,
    cancel: CancellationToken,
    pipeline: Arc<ProcessingPipeline>,
    on_complete: Option<CompletionSink>,
) {
    loop {
        let context = tokio::select! {
            _ = cancel.cancelled() => break,
            next = receiver.recv() => match next {
                Some(context) => context,
                None => break,
            },
        };

        let station = context.waveform.station_code.clone();
        let outcome = AssertUnwindSafe(process_one(&pipeline, &on_complete, context))
            .catch_unwind()
            .await;
        if outcome.is_err() {
            error!(station = %station, "Pipeline execution panicked; worker continues");
        }
    }
    info!("Realtime queue worker exited");
}

async fn process_one(
    pipeline: &ProcessingPipeline,
    on_complete: &Option<CompletionSink>,
    context: ProcessingContext,
) {
    let processed = pipeline.run(context).await;
    debug!(
        station = %processed.waveform.station_code,
        errors = processed.errors.len(),
        "Pipeline completed"
    );
    if let Some(sink) = on_complete {
        if let Err(e) = sink(processed).await {
            warn!(error = %e, "Completion sink failed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context::WaveformPayload;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::time::Duration;

    fn test_context(station: &str) -> ProcessingContext {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ProcessingContext::new(WaveformPayload::new(
            station,
            Some("NC".to_string()),
            start,
            start + chrono::Duration::seconds(1),
            vec![0.0; 10],
            10.0,
            HashMap::new(),
        ))
    }

    /// Sink that records station codes in completion order.
    fn recording_sink() -> (CompletionSink, Arc<std::sync::Mutex<Vec<String>>>) {
        let seen: Arc<std::sync::Mutex<Vec<String>>> = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink: CompletionSink = Arc::new(move |context: ProcessingContext| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.lock().unwrap().push(context.waveform.station_code);
                Ok(())
            }
            .boxed()
        });
        (sink, seen)
    }

    async fn wait_for_count(seen: &std::sync::Mutex<Vec<String>>, count: usize) {
        for _ in 0..200 {
            if seen.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("worker did not process {count} items in time");
    }

    #[tokio::test]
    async fn worker_processes_in_fifo_order() {
        let (sink, seen) = recording_sink();
        let queue = RealtimeQueue::new(
            Arc::new(ProcessingPipeline::with_default_estimators()),
            10,
            Some(sink),
        );

        for i in 0..5 {
            queue.submit(test_context(&format!("S{i}"))).await.unwrap();
        }
        queue.start().await;

        wait_for_count(&seen, 5).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["S0", "S1", "S2", "S3", "S4"]
        );
        queue.stop().await;
    }

    #[tokio::test]
    async fn submit_blocks_at_capacity_until_worker_frees_a_slot() {
        let (sink, seen) = recording_sink();
        let queue = Arc::new(RealtimeQueue::new(
            Arc::new(ProcessingPipeline::with_default_estimators()),
            2,
            Some(sink),
        ));

        // Worker not started: fill the queue.
        queue.submit(test_context("A")).await.unwrap();
        queue.submit(test_context("B")).await.unwrap();
        assert_eq!(queue.len(), 2);

        // Third submit must block while the queue is full.
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), queue.submit(test_context("C"))).await;
        assert!(blocked.is_err(), "submit should block at capacity");
        assert_eq!(queue.len(), 2);

        // Starting the worker frees slots; the retry completes.
        queue.start().await;
        tokio::time::timeout(Duration::from_secs(1), queue.submit(test_context("C")))
            .await
            .expect("submit should unblock once the worker drains")
            .unwrap();

        wait_for_count(&seen, 3).await;
        queue.stop().await;
    }

    #[tokio::test]
    async fn stop_joins_worker_and_is_safe_to_repeat() {
        let queue = RealtimeQueue::new(
            Arc::new(ProcessingPipeline::with_default_estimators()),
            4,
            None,
        );
        queue.start().await;
        queue.stop().await;
        // Second stop is a no-op.
        queue.stop().await;

        // After stop, start does not resurrect a worker and submit fails
        // once the channel closes with the worker's receiver.
        queue.start().await;
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let (sink, seen) = recording_sink();
        let queue = RealtimeQueue::new(
            Arc::new(ProcessingPipeline::with_default_estimators()),
            4,
            Some(sink),
        );
        queue.start().await;
        queue.start().await;

        queue.submit(test_context("ONLY")).await.unwrap();
        wait_for_count(&seen, 1).await;
        // A duplicate worker would have raced the single item; exactly one
        // completion proves one consumer.
        assert_eq!(seen.lock().unwrap().len(), 1);
        queue.stop().await;
    }
}
