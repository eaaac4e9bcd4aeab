//! Violation event - the record produced when a vehicle is caught speeding.

use crate::{Point, VehicleId};
use serde::{Deserialize, Serialize};

/// Simulation tick index. Ticks start at 0 and only move forward.
pub type Tick = u64;

/// Convert meters per second to km/h, rounded to one decimal.
///
/// This is the rounding the collector API expects, so it is applied once
/// at event construction and never re-derived downstream.
#[inline]
pub fn ms_to_kmh(ms: f64) -> f64 {
    (ms * 3.6 * 10.0).round() / 10.0
}

/// A single speed-limit violation, fully denormalized.
///
/// Carries everything a consumer needs without further lookups: ids, the
/// tick and position of the offense, and speeds in both m/s and km/h. The
/// serialized field names are the collector wire format; do not rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEvent {
    /// Run/session this event belongs to, if one was configured.
    pub run_id: Option<String>,
    /// Zone that caught the vehicle.
    pub zone_id: String,
    /// Provider-assigned vehicle id.
    pub entity_id: VehicleId,
    /// Human-facing registration plate assigned for this run.
    pub display_id: String,
    /// Tick at which the violation was observed.
    pub tick: Tick,
    /// Vehicle position at the moment of the offense, `[x, y]` on the wire.
    pub location: Point,
    /// Zone speed limit in m/s.
    pub speed_limit: f64,
    /// Zone speed limit in km/h, rounded to one decimal.
    pub speed_limit_kmh: f64,
    /// Measured speed in m/s.
    pub speed: f64,
    /// Measured speed in km/h, rounded to one decimal.
    pub speed_kmh: f64,
    /// How far over the limit, in km/h, rounded to one decimal.
    pub overspeed_kmh: f64,
    /// Free-form zone description, empty if none was configured.
    pub description: String,
}

impl ViolationEvent {
    /// Build an event from raw telemetry readings.
    ///
    /// The km/h fields are derived here; `speed` and `speed_limit` stay in
    /// m/s as measured. `overspeed_kmh` is rounded from the raw m/s
    /// difference, not from the two already-rounded km/h values.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: Option<String>,
        zone_id: impl Into<String>,
        entity_id: VehicleId,
        display_id: impl Into<String>,
        tick: Tick,
        location: Point,
        speed_limit: f64,
        speed: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            run_id,
            zone_id: zone_id.into(),
            entity_id,
            display_id: display_id.into(),
            tick,
            location,
            speed_limit,
            speed_limit_kmh: ms_to_kmh(speed_limit),
            speed,
            speed_kmh: ms_to_kmh(speed),
            overspeed_kmh: ms_to_kmh(speed - speed_limit),
            description: description.into(),
        }
    }

    /// How far over the limit, in m/s (unrounded).
    #[inline]
    pub fn overspeed(&self) -> f64 {
        self.speed - self.speed_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> ViolationEvent {
        ViolationEvent::new(
            Some("run-1".to_string()),
            "radar_center",
            VehicleId::from("veh_12"),
            "48213-B-07",
            42,
            Point::new(105.0, 98.0),
            10.0,
            15.0,
            "city center approach",
        )
    }

    #[test]
    fn test_kmh_rounding() {
        assert_eq!(ms_to_kmh(13.89), 50.0);
        assert_eq!(ms_to_kmh(15.0), 54.0);
        assert_eq!(ms_to_kmh(19.4), 69.8);
    }

    #[test]
    fn test_derived_fields() {
        let event = sample_event();
        assert_eq!(event.speed_limit_kmh, 36.0);
        assert_eq!(event.speed_kmh, 54.0);
        assert_eq!(event.overspeed_kmh, 18.0);
        assert!((event.overspeed() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wire_format() {
        let event = sample_event();
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["run_id"], "run-1");
        assert_eq!(value["zone_id"], "radar_center");
        assert_eq!(value["entity_id"], "veh_12");
        assert_eq!(value["display_id"], "48213-B-07");
        assert_eq!(value["tick"], 42);
        assert_eq!(value["location"], serde_json::json!([105.0, 98.0]));
        assert_eq!(value["speed_limit"], 10.0);
        assert_eq!(value["speed_kmh"], 54.0);
        assert_eq!(value["overspeed_kmh"], 18.0);
        assert_eq!(value["description"], "city center approach");
    }

    #[test]
    fn test_missing_run_id_serializes_as_null() {
        let mut event = sample_event();
        event.run_id = None;
        let value = serde_json::to_value(&event).unwrap();
        assert!(value["run_id"].is_null());
    }
}
