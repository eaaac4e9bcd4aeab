//! A single radar zone: geometry, cooldown state, and the per-vehicle check.

use contracts::{
    Point, TelemetryError, TelemetryProvider, Tick, VehicleId, ViolationEvent, ZoneConfig,
};
use tracing::{debug, warn};

use crate::cooldown::CooldownStore;
use crate::geometry::{self, BoundingBox};
use crate::plates::PlateRegistry;
use crate::resolver;

/// Road segment resolution lifecycle.
///
/// A zone starts `Unresolved` and becomes `Resolved` exactly once, on the
/// first successful topology scan. An empty segment list is still
/// `Resolved`: the scan ran, there is simply no road near the zone.
#[derive(Debug, Clone)]
pub(crate) enum SegmentResolution {
    Unresolved,
    Resolved(Vec<String>),
}

/// Per-zone counters exposed for run summaries.
#[derive(Debug, Clone)]
pub struct ZoneStats {
    pub zone_id: String,
    pub checks: u64,
    pub violations: u64,
    pub cooldown_entries: usize,
    pub resolved: bool,
    pub nearby_segments: usize,
}

/// One speed radar zone.
///
/// Owns its cooldown map and counters; all mutation happens through
/// [`check_vehicle`] and [`sweep`], which the engine drives in zone
/// configuration order every tick.
///
/// [`check_vehicle`]: RadarZone::check_vehicle
/// [`sweep`]: RadarZone::sweep
#[derive(Debug)]
pub struct RadarZone {
    id: String,
    run_id: Option<String>,
    center: Point,
    radius: f64,
    speed_limit: f64,
    description: String,
    bbox: BoundingBox,
    cooldown: CooldownStore,
    segments: SegmentResolution,
    total_checks: u64,
    total_violations: u64,
}

impl RadarZone {
    pub fn new(config: &ZoneConfig, cooldown_window: u64, run_id: Option<String>) -> Self {
        let center = config.center();
        Self {
            id: config.id.clone(),
            run_id,
            center,
            radius: config.detection_radius,
            speed_limit: config.speed_limit,
            description: config.description.clone(),
            bbox: BoundingBox::around(center, config.detection_radius),
            cooldown: CooldownStore::new(cooldown_window),
            segments: SegmentResolution::Unresolved,
            total_checks: 0,
            total_violations: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the topology scan has run for this zone.
    pub fn is_resolved(&self) -> bool {
        matches!(self.segments, SegmentResolution::Resolved(_))
    }

    /// Segments intersecting the detection circle; empty until resolved.
    pub fn nearby_segments(&self) -> &[String] {
        match &self.segments {
            SegmentResolution::Resolved(segments) => segments,
            SegmentResolution::Unresolved => &[],
        }
    }

    /// Zone membership test: bounding box first, then the exact circle.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        geometry::in_zone(self.center, self.radius, &self.bbox, p)
    }

    /// Scan the road topology once and remember which segments touch the
    /// detection circle. Idempotent: a resolved zone returns immediately.
    ///
    /// # Errors
    /// Only a failed segment enumeration is propagated; per-lane misses are
    /// skipped inside the scan.
    pub fn resolve_segments<P: TelemetryProvider>(
        &mut self,
        provider: &P,
    ) -> Result<(), TelemetryError> {
        if self.is_resolved() {
            return Ok(());
        }

        let segments = resolver::resolve_zone_segments(self, provider)?;
        if segments.is_empty() {
            warn!(
                zone_id = %self.id,
                "no road segments intersect the detection circle; zone stays inert under edge-based detection"
            );
        } else {
            debug!(
                zone_id = %self.id,
                segments = segments.len(),
                "zone resolved to nearby segments"
            );
        }
        self.segments = SegmentResolution::Resolved(segments);
        Ok(())
    }

    /// Check one vehicle against this zone at `tick`.
    ///
    /// Every invocation counts as a check. The decision order is fixed:
    /// cooldown suppression, zone membership, then the speed comparison.
    /// Speed exactly at the limit is not a violation.
    pub fn check_vehicle(
        &mut self,
        vehicle: &VehicleId,
        position: Point,
        speed: f64,
        tick: Tick,
        plates: &mut PlateRegistry,
    ) -> Option<ViolationEvent> {
        self.total_checks += 1;

        if self.cooldown.is_suppressed(vehicle, tick) {
            return None;
        }

        if !self.contains(position) {
            return None;
        }

        if speed <= self.speed_limit {
            return None;
        }

        self.cooldown.record(vehicle.clone(), tick);
        self.total_violations += 1;

        let display_id = plates.display_for(vehicle);
        debug!(
            zone_id = %self.id,
            vehicle_id = %vehicle,
            plate = %display_id,
            tick,
            speed,
            limit = self.speed_limit,
            "violation detected"
        );

        Some(ViolationEvent::new(
            self.run_id.clone(),
            self.id.clone(),
            vehicle.clone(),
            display_id,
            tick,
            position,
            self.speed_limit,
            speed,
            self.description.clone(),
        ))
    }

    /// Evict expired cooldown entries; returns how many were removed.
    pub fn sweep(&mut self, tick: Tick) -> usize {
        self.cooldown.sweep(tick)
    }

    pub fn checks(&self) -> u64 {
        self.total_checks
    }

    pub fn violations(&self) -> u64 {
        self.total_violations
    }

    pub fn stats(&self) -> ZoneStats {
        ZoneStats {
            zone_id: self.id.clone(),
            checks: self.total_checks,
            violations: self.total_violations,
            cooldown_entries: self.cooldown.len(),
            resolved: self.is_resolved(),
            nearby_segments: self.nearby_segments().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_zone(cooldown: u64) -> RadarZone {
        let config = ZoneConfig {
            id: "radar_test".into(),
            x: 100.0,
            y: 100.0,
            speed_limit: 10.0,
            detection_radius: 50.0,
            description: "test approach".into(),
        };
        RadarZone::new(&config, cooldown, Some("run-1".into()))
    }

    #[test]
    fn test_violation_then_cooldown_then_violation() {
        let mut zone = test_zone(100);
        let mut plates = PlateRegistry::with_seed(1);
        let veh: VehicleId = "veh_1".into();
        let at_center = Point::new(100.0, 100.0);

        // Speeding inside the zone at tick 0
        let event = zone.check_vehicle(&veh, at_center, 15.0, 0, &mut plates);
        let event = event.expect("first pass should violate");
        assert_eq!(event.zone_id, "radar_test");
        assert_eq!(event.tick, 0);
        assert!((event.overspeed() - 5.0).abs() < f64::EPSILON);

        // Still speeding one tick later: suppressed
        assert!(zone
            .check_vehicle(&veh, at_center, 15.0, 1, &mut plates)
            .is_none());

        // Window elapsed: caught again, same plate
        let again = zone
            .check_vehicle(&veh, at_center, 15.0, 100, &mut plates)
            .expect("violation after cooldown window");
        assert_eq!(again.display_id, event.display_id);
        assert_eq!(zone.stats().violations, 2);
    }

    #[test]
    fn test_outside_bounding_box_is_ignored() {
        let mut zone = test_zone(100);
        let mut plates = PlateRegistry::with_seed(1);

        let outside = Point::new(200.0, 200.0);
        assert!(zone
            .check_vehicle(&"veh_1".into(), outside, 50.0, 0, &mut plates)
            .is_none());
        assert_eq!(zone.stats().violations, 0);
        assert_eq!(zone.stats().checks, 1);
    }

    #[test]
    fn test_inside_box_outside_circle_is_ignored() {
        let mut zone = test_zone(100);
        let mut plates = PlateRegistry::with_seed(1);

        // Box corner region: |dx| = |dy| = 45 -> distance ~63.6 > 50
        let corner = Point::new(145.0, 145.0);
        assert!(zone
            .check_vehicle(&"veh_1".into(), corner, 50.0, 0, &mut plates)
            .is_none());
    }

    #[test]
    fn test_speed_at_limit_is_not_a_violation() {
        let mut zone = test_zone(100);
        let mut plates = PlateRegistry::with_seed(1);
        let at_center = Point::new(100.0, 100.0);

        assert!(zone
            .check_vehicle(&"veh_1".into(), at_center, 10.0, 0, &mut plates)
            .is_none());
        assert!(zone
            .check_vehicle(&"veh_1".into(), at_center, 10.0001, 1, &mut plates)
            .is_some());
    }

    #[test]
    fn test_every_invocation_counts_as_check() {
        let mut zone = test_zone(100);
        let mut plates = PlateRegistry::with_seed(1);
        let veh: VehicleId = "veh_1".into();
        let at_center = Point::new(100.0, 100.0);

        zone.check_vehicle(&veh, at_center, 15.0, 0, &mut plates); // violation
        zone.check_vehicle(&veh, at_center, 15.0, 1, &mut plates); // suppressed
        zone.check_vehicle(&veh, Point::new(0.0, 0.0), 15.0, 200, &mut plates); // outside
        zone.check_vehicle(&veh, at_center, 5.0, 300, &mut plates); // under limit

        assert_eq!(zone.stats().checks, 4);
        assert_eq!(zone.stats().violations, 1);
    }

    #[test]
    fn test_resolution_is_one_shot() {
        use telemetry::MockTelemetry;

        let mut zone = test_zone(100);
        let mut provider = MockTelemetry::new();

        // No roads anywhere: the zone still counts as resolved
        zone.resolve_segments(&provider).unwrap();
        assert!(zone.is_resolved());
        assert!(zone.nearby_segments().is_empty());

        // A road appears later; the zone must not pick it up
        let lane: Vec<Point> = (0..20).map(|i| Point::new(i as f64 * 10.0, 100.0)).collect();
        provider.add_segment("seg_late", vec![lane]);
        zone.resolve_segments(&provider).unwrap();
        assert!(zone.nearby_segments().is_empty());
    }

    #[test]
    fn test_sweep_clears_expired_cooldowns() {
        let mut zone = test_zone(100);
        let mut plates = PlateRegistry::with_seed(1);
        let at_center = Point::new(100.0, 100.0);

        zone.check_vehicle(&"veh_1".into(), at_center, 15.0, 0, &mut plates);
        zone.check_vehicle(&"veh_2".into(), at_center, 15.0, 460, &mut plates);
        assert_eq!(zone.stats().cooldown_entries, 2);

        assert_eq!(zone.sweep(500), 1);
        assert_eq!(zone.stats().cooldown_entries, 1);
    }

    #[test]
    fn test_event_carries_zone_fields() {
        let mut zone = test_zone(100);
        let mut plates = PlateRegistry::with_seed(1);

        let position = Point::new(110.0, 95.0);
        let event = zone
            .check_vehicle(&"veh_7".into(), position, 12.5, 42, &mut plates)
            .unwrap();

        assert_eq!(event.run_id.as_deref(), Some("run-1"));
        assert_eq!(event.entity_id, "veh_7");
        assert_eq!(event.location, position);
        assert_eq!(event.speed_limit, 10.0);
        assert_eq!(event.speed, 12.5);
        assert_eq!(event.description, "test approach");
    }
}
