//! TelemetryProvider trait - Simulation telemetry abstraction
//!
//! Defines the unified query interface the detection engine runs against,
//! decoupling detection strategies from the concrete simulation backend.

use std::collections::HashMap;

use crate::{Point, TelemetryError, VehicleId};

/// State of one vehicle as reported by a zone subscription.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    /// World position in meters.
    pub position: Point,
    /// Speed in m/s.
    pub speed: f64,
}

/// Telemetry query interface over a stepped traffic simulation.
///
/// All methods are synchronous: the engine runs in lockstep with the
/// simulation and every query refers to the current tick. Implementations
/// report failures through [`TelemetryError`]; callers decide per call site
/// whether a failure is skippable (most are) or fatal (topology queries at
/// startup).
///
/// # Conventions
///
/// * Lane ids are `{segment_id}_{lane_index}` with indices starting at 0.
/// * Internal junction segments have ids starting with `:` and are skipped
///   during zone resolution.
pub trait TelemetryProvider {
    /// All vehicles currently present in the simulation.
    fn list_vehicles(&self) -> Result<Vec<VehicleId>, TelemetryError>;

    /// Vehicles currently on the given road segment.
    fn vehicles_on_segment(&self, segment_id: &str) -> Result<Vec<VehicleId>, TelemetryError>;

    /// Current world position of a vehicle.
    fn position(&self, vehicle_id: &VehicleId) -> Result<Point, TelemetryError>;

    /// Current speed of a vehicle in m/s.
    fn speed(&self, vehicle_id: &VehicleId) -> Result<f64, TelemetryError>;

    /// All road segment ids in the topology.
    fn list_segments(&self) -> Result<Vec<String>, TelemetryError>;

    /// Number of lanes on a segment.
    fn lane_count(&self, segment_id: &str) -> Result<usize, TelemetryError>;

    /// Polyline shape of a lane.
    fn lane_shape(&self, lane_id: &str) -> Result<Vec<Point>, TelemetryError>;

    /// Register a circular region of interest around a zone center.
    ///
    /// After a successful subscription, [`nearby_vehicles`] for the same
    /// zone id returns the vehicles inside the region each tick.
    ///
    /// [`nearby_vehicles`]: TelemetryProvider::nearby_vehicles
    fn subscribe_zone(
        &mut self,
        zone_id: &str,
        center: Point,
        radius: f64,
    ) -> Result<(), TelemetryError>;

    /// Vehicles currently inside a subscribed region, with their state.
    fn nearby_vehicles(
        &self,
        zone_id: &str,
    ) -> Result<HashMap<VehicleId, VehicleSnapshot>, TelemetryError>;
}
