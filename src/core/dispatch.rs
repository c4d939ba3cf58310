//! # Shared delivery worker: serialized receiver callbacks.
//!
//! One [`Dispatcher`] exists per bus tree. Nodes hand it `(event, snapshot)`
//! jobs; a single worker task drains them in order and invokes receiver
//! callbacks one at a time.
//!
//! ## Rules
//! - **Enqueue never blocks**: jobs go over an unbounded channel, publishing
//!   is fire-and-forget.
//! - **Serialized delivery**: no two receiver callbacks ever run concurrently
//!   with each other, so receivers need no internal synchronization against
//!   concurrent invocation and two events delivered to overlapping receiver
//!   sets are never interleaved mid-callback.
//! - **Per-receiver isolation**: a panicking callback is caught, logged, and
//!   does not prevent delivery to the remaining receivers in the snapshot.
//! - **No cancellation of in-flight work**: there is no way to cancel or
//!   await a delivery; shutting the worker down (tree root close) drops any
//!   jobs still queued.
//!
//! ## Panic handling
//! Worker delivery uses `catch_unwind` to isolate panics. `AssertUnwindSafe`
//! is involved, which can leave shared state inconsistent if a receiver
//! panics while holding a lock.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::node::ReceiverHandle;
use crate::events::Event;

/// One unit of fan-out: an event plus the receiver snapshot taken at its
/// record phase. Snapshot order is the delivery order.
struct DeliveryJob {
    event: Event,
    receivers: Vec<ReceiverHandle>,
}

/// Handle to the tree's delivery worker.
///
/// Cheap to clone; every node in a tree holds the same dispatcher.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    tx: mpsc::UnboundedSender<DeliveryJob>,
    token: CancellationToken,
}

impl Dispatcher {
    /// Spawns the worker task and returns the handle.
    ///
    /// Must be called inside a Tokio runtime.
    pub(crate) fn start() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<DeliveryJob>();
        let token = CancellationToken::new();
        let worker_token = token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = worker_token.cancelled() => break,
                    job = rx.recv() => match job {
                        Some(job) => deliver(job).await,
                        None => break,
                    },
                }
            }
        });

        Self { tx, token }
    }

    /// Queues one fan-out job; returns immediately.
    pub(crate) fn enqueue(&self, event: Event, receivers: Vec<ReceiverHandle>) {
        if receivers.is_empty() {
            return;
        }
        let capability = event.event_type().name();
        let method = event.method();
        if self.tx.send(DeliveryJob { event, receivers }).is_err() {
            debug!(capability, method, "event dropped: delivery worker stopped");
        }
    }

    /// Stops the worker. Jobs still queued are dropped.
    pub(crate) fn shutdown(&self) {
        self.token.cancel();
    }
}

/// Delivers one event to every receiver in its snapshot, in order, isolating
/// panics per receiver.
async fn deliver(job: DeliveryJob) {
    for receiver in &job.receivers {
        let event = &job.event;
        let fut = async move { event.replay(receiver.erased()) };

        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(
                    capability = job.event.event_type().name(),
                    method = job.event.method(),
                    error = %err,
                    "delivery skipped"
                );
            }
            Err(panic_err) => {
                let info = {
                    let any = &*panic_err;
                    if let Some(msg) = any.downcast_ref::<&'static str>() {
                        (*msg).to_string()
                    } else if let Some(msg) = any.downcast_ref::<String>() {
                        msg.clone()
                    } else {
                        "unknown panic".to_string()
                    }
                };
                warn!(
                    capability = job.event.event_type().name(),
                    method = job.event.method(),
                    panic = %info,
                    "receiver panicked during delivery"
                );
            }
        }
    }
}
