//! Per-zone violation cooldown tracking.
//!
//! Suppresses repeat violations from the same vehicle inside one zone for a
//! configurable number of ticks. Entries are only removed by the periodic
//! sweep, so the map stays small relative to traffic through the zone.

use std::collections::HashMap;

use contracts::{Tick, VehicleId};

/// Cooldown map for a single zone.
///
/// A vehicle is suppressed while `tick - recorded < window`. At exactly
/// `recorded + window` the vehicle is eligible again.
#[derive(Debug)]
pub struct CooldownStore {
    window: u64,
    entries: HashMap<VehicleId, Tick>,
}

impl CooldownStore {
    pub fn new(window: u64) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// Cooldown window in ticks.
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Record a violation at `tick`, replacing any previous entry.
    pub fn record(&mut self, vehicle: VehicleId, tick: Tick) {
        self.entries.insert(vehicle, tick);
    }

    /// Whether the vehicle is still inside its cooldown window at `tick`.
    ///
    /// Ticks never run backwards, but `saturating_sub` keeps a stale entry
    /// from panicking if they ever did.
    pub fn is_suppressed(&self, vehicle: &VehicleId, tick: Tick) -> bool {
        match self.entries.get(vehicle) {
            Some(&recorded) => tick.saturating_sub(recorded) < self.window,
            None => false,
        }
    }

    /// Drop all entries whose window has elapsed by `tick`.
    ///
    /// Returns the number of evicted entries.
    pub fn sweep(&mut self, tick: Tick) -> usize {
        let before = self.entries.len();
        let window = self.window;
        self.entries
            .retain(|_, &mut recorded| tick.saturating_sub(recorded) < window);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppression_window() {
        let mut store = CooldownStore::new(100);
        let veh: VehicleId = "veh_1".into();

        store.record(veh.clone(), 10);

        assert!(store.is_suppressed(&veh, 10));
        assert!(store.is_suppressed(&veh, 11));
        assert!(store.is_suppressed(&veh, 109));
        // Exactly window ticks later the vehicle is eligible again
        assert!(!store.is_suppressed(&veh, 110));
    }

    #[test]
    fn test_unknown_vehicle_not_suppressed() {
        let store = CooldownStore::new(100);
        assert!(!store.is_suppressed(&"veh_9".into(), 50));
    }

    #[test]
    fn test_record_refreshes_entry() {
        let mut store = CooldownStore::new(100);
        let veh: VehicleId = "veh_1".into();

        store.record(veh.clone(), 0);
        store.record(veh.clone(), 150);

        assert!(store.is_suppressed(&veh, 200));
        assert!(!store.is_suppressed(&veh, 250));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sweep_evicts_only_expired() {
        let mut store = CooldownStore::new(100);
        store.record("veh_old".into(), 0);
        store.record("veh_fresh".into(), 450);

        let evicted = store.sweep(500);

        assert_eq!(evicted, 1);
        assert_eq!(store.len(), 1);
        assert!(store.is_suppressed(&"veh_fresh".into(), 500));
        assert!(!store.is_suppressed(&"veh_old".into(), 500));
    }

    #[test]
    fn test_sweep_on_empty_store() {
        let mut store = CooldownStore::new(100);
        assert_eq!(store.sweep(1000), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_window_never_suppresses() {
        let mut store = CooldownStore::new(0);
        let veh: VehicleId = "veh_1".into();
        store.record(veh.clone(), 5);
        assert!(!store.is_suppressed(&veh, 5));
        assert_eq!(store.sweep(5), 1);
    }
}
