//! Delivery metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for the background delivery queue
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Events currently waiting in the queue
    queue_len: AtomicUsize,
    /// Events delivered to a collector (primary or fallback)
    delivered: AtomicU64,
    /// Events whose delivery failed after all attempts
    failed: AtomicU64,
    /// Events dropped because the queue was full
    dropped: AtomicU64,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            queue_len: self.queue_len(),
            delivered: self.delivered(),
            failed: self.failed(),
            dropped: self.dropped(),
        }
    }
}

/// Point-in-time copy of the delivery counters (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct DeliverySnapshot {
    pub queue_len: usize,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = DeliveryMetrics::new();
        metrics.inc_delivered();
        metrics.inc_delivered();
        metrics.inc_failed();
        metrics.inc_dropped();
        metrics.set_queue_len(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.delivered, 2);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(snapshot.queue_len, 4);
    }
}
