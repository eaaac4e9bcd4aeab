//! Registration plate assignment for display ids.
//!
//! Telemetry vehicle ids are machine-generated and unfriendly in reports,
//! so each vehicle gets a stable pseudo-plate the first time it violates.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use contracts::VehicleId;

const PLATE_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_ATTEMPTS: usize = 100;

/// Owned plate registry: assignment and uniqueness live here, not in any
/// global state, so independent runs cannot interfere with each other.
///
/// Plates have the form `NNNNN-L-NN`. A vehicle keeps the same plate for
/// the lifetime of the registry; no two vehicles ever share one.
#[derive(Debug)]
pub struct PlateRegistry {
    rng: StdRng,
    assigned: HashMap<VehicleId, String>,
    issued: HashSet<String>,
}

impl PlateRegistry {
    /// Registry seeded from the OS.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Deterministic registry for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            assigned: HashMap::new(),
            issued: HashSet::new(),
        }
    }

    /// Plate for a vehicle, minting one on first sight.
    pub fn display_for(&mut self, vehicle: &VehicleId) -> String {
        if let Some(plate) = self.assigned.get(vehicle) {
            return plate.clone();
        }
        let plate = self.mint();
        self.assigned.insert(vehicle.clone(), plate.clone());
        plate
    }

    /// Number of distinct plates issued so far.
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    fn mint(&mut self) -> String {
        for _ in 0..RANDOM_ATTEMPTS {
            let number = self.rng.random_range(10000..=99999u32);
            let letter = PLATE_LETTERS[self.rng.random_range(0..PLATE_LETTERS.len())] as char;
            let suffix = self.rng.random_range(10..=99u32);
            let plate = format!("{number}-{letter}-{suffix}");
            if self.issued.insert(plate.clone()) {
                return plate;
            }
        }

        // The random space is effectively exhausted; derive a unique plate
        // from the issue counter instead of spinning forever.
        let mut n = self.issued.len() as u64;
        loop {
            let plate = format!("{:05}-Z-{:02}", 10000 + n % 90000, 10 + n % 90);
            if self.issued.insert(plate.clone()) {
                return plate;
            }
            n += 1;
        }
    }
}

impl Default for PlateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
