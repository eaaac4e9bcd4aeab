//! DeliveryHandle - bounded queue and worker task in front of an EventSink
//!
//! Keeps remote delivery off the tick path: `try_send` never blocks, and a
//! full queue drops the event (it is already journaled by then).

use std::sync::Arc;

use contracts::{EventSink, ViolationEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::DeliveryMetrics;

/// Owner of one delivery queue and its worker task.
pub struct DeliveryHandle {
    name: String,
    tx: mpsc::Sender<ViolationEvent>,
    metrics: Arc<DeliveryMetrics>,
    worker: JoinHandle<()>,
}

impl DeliveryHandle {
    /// Wrap `sink` in a bounded queue and start its worker.
    pub fn spawn<S: EventSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(DeliveryMetrics::new());
        let worker = tokio::spawn(delivery_worker(
            sink,
            rx,
            Arc::clone(&metrics),
            name.clone(),
        ));

        Self {
            name,
            tx,
            metrics,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<DeliveryMetrics> {
        &self.metrics
    }

    /// Queue an event for delivery (non-blocking).
    ///
    /// Returns true if queued, false if the event was dropped.
    pub fn try_send(&self, event: ViolationEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => {
                let used = self.tx.max_capacity().saturating_sub(self.tx.capacity());
                self.metrics.set_queue_len(used);
                true
            }
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                self.metrics.inc_dropped();
                metrics::counter!("speed_radar_deliveries_total", "status" => "dropped")
                    .increment(1);
                warn!(
                    sink = %self.name,
                    zone_id = %dropped.zone_id,
                    vehicle_id = %dropped.entity_id,
                    "delivery queue full, event dropped (already journaled)"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "delivery worker closed unexpectedly");
                false
            }
        }
    }

    /// Stop accepting events, drain the queue, and wait for the worker.
    #[instrument(name = "delivery_handle_shutdown", skip(self))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!(sink = %self.name, error = ?e, "delivery worker panicked");
        }
        debug!(sink = %self.name, "delivery handle shutdown complete");
    }
}

/// Worker task that consumes queued events and delivers them.
#[instrument(
    name = "delivery_worker_loop",
    skip(sink, rx, stats),
    fields(sink = %name)
)]
async fn delivery_worker<S: EventSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<ViolationEvent>,
    stats: Arc<DeliveryMetrics>,
    name: String,
) {
    debug!(sink = %name, "delivery worker started");

    while let Some(event) = rx.recv().await {
        stats.set_queue_len(rx.len());

        match sink.deliver(&event).await {
            Ok(()) => {
                stats.inc_delivered();
                metrics::counter!("speed_radar_deliveries_total", "status" => "delivered")
                    .increment(1);
            }
            Err(e) => {
                stats.inc_failed();
                metrics::counter!("speed_radar_deliveries_total", "status" => "failed")
                    .increment(1);
                warn!(
                    sink = %name,
                    zone_id = %event.zone_id,
                    vehicle_id = %event.entity_id,
                    error = %e,
                    "delivery failed, event kept in journal only"
                );
                // Keep consuming: one failed delivery must not stall the queue
            }
        }
    }

    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "close failed on shutdown");
    }

    debug!(sink = %name, "delivery worker stopped");
}
