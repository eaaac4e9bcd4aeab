//! ViolationSink - journal plus optional remote delivery behind one call

use std::sync::Arc;

use contracts::{RadarError, ViolationEvent};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use crate::handle::DeliveryHandle;
use crate::journal::ViolationJournal;
use crate::metrics::DeliverySnapshot;

/// How long shutdown waits for queued deliveries to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ViolationSink {
    journal: ViolationJournal,
    delivery: Option<DeliveryHandle>,
}

impl ViolationSink {
    pub fn new(journal: ViolationJournal, delivery: Option<DeliveryHandle>) -> Self {
        Self { journal, delivery }
    }

    /// Record one violation: journal write first (an error here is fatal to
    /// the run), then hand the event to the delivery queue without waiting.
    pub fn emit(&mut self, event: &ViolationEvent) -> Result<(), RadarError> {
        self.journal.append(event)?;

        info!(
            zone_id = %event.zone_id,
            plate = %event.display_id,
            vehicle_id = %event.entity_id,
            tick = event.tick,
            speed_kmh = event.speed_kmh,
            limit_kmh = event.speed_limit_kmh,
            "violation recorded"
        );

        if let Some(delivery) = &self.delivery {
            delivery.try_send(event.clone());
        }
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.journal.records()
    }

    pub fn delivery_metrics(&self) -> Option<DeliverySnapshot> {
        self.delivery.as_ref().map(|handle| handle.metrics().snapshot())
    }

    /// Drain the delivery queue (bounded wait), then close the journal.
    /// Returns the final delivery counters when delivery was configured.
    pub async fn close(self) -> Result<Option<DeliverySnapshot>, RadarError> {
        let mut final_metrics = None;

        if let Some(delivery) = self.delivery {
            let stats = Arc::clone(delivery.metrics());
            if timeout(DRAIN_TIMEOUT, delivery.shutdown()).await.is_err() {
                warn!("delivery queue did not drain in time, abandoning remaining events");
            }
            final_metrics = Some(stats.snapshot());
        }

        self.journal.close()?;
        Ok(final_metrics)
    }
}
