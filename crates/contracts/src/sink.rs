//! EventSink trait - Remote delivery interface
//!
//! Defines the abstract interface for best-effort violation forwarding.

use crate::{RadarError, ViolationEvent};

/// Event delivery trait
///
/// Implemented by transports that forward violations off the tick path.
/// Delivery is best effort: a failed delivery must never affect the local
/// journal, which is the system of record.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one violation event
    ///
    /// # Errors
    /// Returns delivery error (should include target context)
    async fn deliver(&mut self, event: &ViolationEvent) -> Result<(), RadarError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), RadarError>;
}
