//! Event pipeline
//!
//! A bounded queue of lifecycle events drained by a pool of worker tasks.
//! Producers (data-plane heartbeats, reconcilers, API handlers, and the
//! handlers themselves during fan-out) offer events with a non-blocking
//! [`EventQueue::add`]; a full queue rejects the offer and the caller moves
//! on, because every notification is advisory and the next reconciliation
//! tick re-derives it.
//!
//! A handler that fails retryably is re-submitted by the retry executor with
//! backoff, preserving the event instance so per-event state (such as the
//! seal state machine position) survives across attempts. Terminal outcomes
//! invoke [`Event::done`] exactly once for cleanup.

use crate::context::Context;
use crate::error::{ControllerError, Result};
use crate::observability::{ControllerMetrics, EventScope};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Polymorphic lifecycle event
///
/// Defaults make both operations no-ops so simple event kinds only override
/// what they need.
#[async_trait]
pub trait Event: Send + 'static {
    /// Metric / logging scope of this event kind
    fn scope(&self) -> EventScope;

    /// React to the event. A retryable error sends the event back through
    /// the retry executor; anything else is terminal.
    async fn handle(&mut self, _ctx: &Arc<Context>) -> Result<()> {
        Ok(())
    }

    /// Cleanup after the terminal outcome (success, terminal error, or
    /// retry exhaustion). Runs exactly once per event.
    async fn done(&mut self, _ctx: &Arc<Context>, _result: &Result<()>) {}
}

struct QueuedEvent {
    event: Box<dyn Event>,
    /// Completed `handle` invocations
    attempts: u32,
    first_enqueued: Instant,
}

impl QueuedEvent {
    fn new(event: Box<dyn Event>) -> Self {
        Self {
            event,
            attempts: 0,
            first_enqueued: Instant::now(),
        }
    }
}

/// Producer handle onto the pipeline's bounded queue
#[derive(Clone)]
pub struct EventQueue {
    tx: mpsc::Sender<QueuedEvent>,
    capacity: usize,
    closed: Arc<AtomicBool>,
}

impl EventQueue {
    /// Non-blocking offer; false when the queue is full or shut down
    pub fn add(&self, event: Box<dyn Event>) -> bool {
        if self.closed.load(Ordering::Relaxed) {
            return false;
        }
        match self.tx.try_send(QueuedEvent::new(event)) {
            Ok(()) => {
                ControllerMetrics::set_queue_depth(self.capacity - self.tx.capacity());
                true
            }
            Err(TrySendError::Full(_)) => {
                ControllerMetrics::increment_queue_full();
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Worker pool draining the event queue
pub struct EventPipeline {
    queue: EventQueue,
    rx: Mutex<Option<mpsc::Receiver<QueuedEvent>>>,
    shutdown_tx: broadcast::Sender<()>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl EventPipeline {
    /// Create a pipeline with a bounded queue; call [`EventPipeline::start`]
    /// to spawn the workers
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            queue: EventQueue {
                tx,
                capacity,
                closed: Arc::new(AtomicBool::new(false)),
            },
            rx: Mutex::new(Some(rx)),
            shutdown_tx,
            workers: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Producer handle for triggers and handler fan-out
    pub fn queue(&self) -> EventQueue {
        self.queue.clone()
    }

    /// Spawn `config.worker_count` workers handling events against `ctx`
    pub async fn start(&self, ctx: Arc<Context>) {
        let rx = self
            .rx
            .lock()
            .await
            .take()
            .expect("pipeline already started");
        let rx = Arc::new(Mutex::new(rx));
        let worker_count = ctx.config.worker_count.max(1);
        let mut workers = self.workers.lock();
        for worker_id in 0..worker_count {
            let ctx = Arc::clone(&ctx);
            let rx = Arc::clone(&rx);
            let tx = self.queue.tx.clone();
            let shutdown = self.shutdown_tx.subscribe();
            workers.push(tokio::spawn(worker_loop(worker_id, ctx, rx, tx, shutdown)));
        }
        info!(workers = worker_count, "event pipeline started");
    }

    /// Stop accepting events and join the workers. Events still queued are
    /// dropped; the periodic reconcilers re-derive them on the next cycle.
    pub async fn shutdown(&self) {
        self.queue.closed.store(true, Ordering::Relaxed);
        let _ = self.shutdown_tx.send(());
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for worker in workers {
            let _ = worker.await;
        }
        info!("event pipeline stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    ctx: Arc<Context>,
    rx: Arc<Mutex<mpsc::Receiver<QueuedEvent>>>,
    tx: mpsc::Sender<QueuedEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    debug!(worker_id, "event worker running");
    loop {
        let item = {
            let mut guard = rx.lock().await;
            tokio::select! {
                _ = shutdown.recv() => None,
                item = guard.recv() => item,
            }
        };
        let Some(mut item) = item else {
            debug!(worker_id, "event worker exiting");
            return;
        };

        let scope = item.event.scope();
        ControllerMetrics::increment_requests(scope);
        let started = Instant::now();
        item.attempts += 1;
        let result = item.event.handle(&ctx).await;
        ControllerMetrics::record_handler_latency(scope, started.elapsed());

        match result {
            Ok(()) => item.event.done(&ctx, &Ok(())).await,
            Err(err) => {
                ControllerMetrics::increment_failures(scope);
                let policy = ctx.config.retry.pipeline;
                let exhausted = item.attempts >= policy.max_attempts
                    || item.first_enqueued.elapsed() > policy.expiry;
                if err.is_retryable() && !exhausted {
                    let delay = policy.backoff(item.attempts - 1);
                    debug!(
                        scope = scope.as_str(),
                        attempts = item.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "re-queueing event"
                    );
                    ControllerMetrics::increment_event_retries(scope);
                    let tx = tx.clone();
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Err(send_err) = tx.send(item).await {
                            let mut item = send_err.0;
                            item.event
                                .done(&ctx, &Err(ControllerError::ShuttingDown))
                                .await;
                        }
                    });
                } else {
                    warn!(
                        scope = scope.as_str(),
                        attempts = item.attempts,
                        error = %err,
                        "event failed terminally"
                    );
                    item.event.done(&ctx, &Err(err)).await;
                }
            }
        }
    }
}
