//! Detection engine: strategy dispatch, tick iteration, cooldown sweep.

use std::collections::HashSet;

use contracts::{
    DetectionStrategy, Point, RadarBlueprint, TelemetryError, TelemetryProvider, Tick, VehicleId,
    ViolationEvent,
};
use tracing::{debug, warn};

use crate::plates::PlateRegistry;
use crate::zone::{RadarZone, ZoneStats};

/// Aggregated counters across all zones.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    pub total_checks: u64,
    pub total_violations: u64,
    pub ticks_processed: u64,
    pub zones: Vec<ZoneStats>,
}

/// The speed radar engine.
///
/// Drives every configured zone once per tick, in configuration order, so
/// the emitted event order is deterministic for a given provider state.
/// [`tick`] never fails: telemetry problems degrade to skipped vehicles or
/// per-zone fallbacks, never to a lost tick.
///
/// [`tick`]: DetectionEngine::tick
pub struct DetectionEngine {
    strategy: DetectionStrategy,
    sweep_interval: u64,
    zones: Vec<RadarZone>,
    plates: PlateRegistry,
    /// Zone ids currently falling back to full scans. Membership changes
    /// are logged once per outage, not once per tick.
    subscription_outages: HashSet<String>,
    ticks_processed: u64,
}

impl DetectionEngine {
    pub fn new(
        zones: Vec<RadarZone>,
        strategy: DetectionStrategy,
        sweep_interval: u64,
        plates: PlateRegistry,
    ) -> Self {
        Self {
            strategy,
            sweep_interval: sweep_interval.max(1),
            zones,
            plates,
            subscription_outages: HashSet::new(),
            ticks_processed: 0,
        }
    }

    /// Build zones from a validated blueprint, preserving configuration order.
    pub fn from_blueprint(
        blueprint: &RadarBlueprint,
        run_id: Option<&str>,
        plates: PlateRegistry,
    ) -> Self {
        let zones = blueprint
            .zones
            .iter()
            .map(|config| {
                RadarZone::new(
                    config,
                    blueprint.engine.cooldown_ticks,
                    run_id.map(str::to_string),
                )
            })
            .collect();
        Self::new(
            zones,
            blueprint.engine.strategy,
            blueprint.engine.sweep_interval,
            plates,
        )
    }

    pub fn strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    pub fn zones(&self) -> &[RadarZone] {
        &self.zones
    }

    /// Zones currently degraded to per-tick full scans.
    pub fn zones_in_fallback(&self) -> usize {
        self.subscription_outages.len()
    }

    pub fn total_checks(&self) -> u64 {
        self.zones.iter().map(RadarZone::checks).sum()
    }

    pub fn total_violations(&self) -> u64 {
        self.zones.iter().map(RadarZone::violations).sum()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_checks: self.total_checks(),
            total_violations: self.total_violations(),
            ticks_processed: self.ticks_processed,
            zones: self.zones.iter().map(RadarZone::stats).collect(),
        }
    }

    /// One-time startup work for the configured strategy.
    ///
    /// Edge-based detection resolves each zone's nearby segments; a failed
    /// topology enumeration is fatal here because the strategy cannot run
    /// without it. Subscription registration failures are not fatal: the
    /// affected zones start in fallback and are retried via their per-tick
    /// queries.
    pub fn prepare<P: TelemetryProvider>(&mut self, provider: &mut P) -> Result<(), TelemetryError> {
        match self.strategy {
            DetectionStrategy::EdgeBased => {
                for zone in &mut self.zones {
                    zone.resolve_segments(provider)?;
                }
            }
            DetectionStrategy::ContextSubscription => {
                for zone in &self.zones {
                    match provider.subscribe_zone(zone.id(), zone.center(), zone.radius()) {
                        Ok(()) => {}
                        Err(err) => {
                            warn!(
                                zone_id = %zone.id(),
                                error = %err,
                                "zone subscription failed at startup, zone falls back to full scans"
                            );
                            self.subscription_outages.insert(zone.id().to_string());
                        }
                    }
                }
            }
            DetectionStrategy::FullScan => {}
        }

        debug!(strategy = %self.strategy, zones = self.zones.len(), "detection engine prepared");
        Ok(())
    }

    /// Run all zone checks for one tick and return the violations found,
    /// in zone configuration order.
    pub fn tick<P: TelemetryProvider>(&mut self, tick: Tick, provider: &P) -> Vec<ViolationEvent> {
        let mut events = Vec::new();

        match self.strategy {
            DetectionStrategy::EdgeBased => self.tick_edge_based(tick, provider, &mut events),
            DetectionStrategy::ContextSubscription => {
                self.tick_subscription(tick, provider, &mut events)
            }
            DetectionStrategy::FullScan => self.tick_full_scan(tick, provider, &mut events),
        }

        if tick % self.sweep_interval == 0 {
            let evicted: usize = self.zones.iter_mut().map(|zone| zone.sweep(tick)).sum();
            if evicted > 0 {
                debug!(tick, evicted, "cooldown sweep evicted expired entries");
            }
        }

        self.ticks_processed += 1;
        events
    }

    /// Check only vehicles on segments resolved near each zone. A vehicle
    /// listed on several nearby segments is checked once.
    fn tick_edge_based<P: TelemetryProvider>(
        &mut self,
        tick: Tick,
        provider: &P,
        events: &mut Vec<ViolationEvent>,
    ) {
        for zone in &mut self.zones {
            let mut seen: HashSet<VehicleId> = HashSet::new();
            let mut candidates: Vec<VehicleId> = Vec::new();

            for segment_id in zone.nearby_segments() {
                match provider.vehicles_on_segment(segment_id) {
                    Ok(ids) => {
                        for id in ids {
                            if seen.insert(id.clone()) {
                                candidates.push(id);
                            }
                        }
                    }
                    Err(err) if err.is_gone() => continue,
                    Err(err) => {
                        debug!(
                            zone_id = %zone.id(),
                            segment_id = %segment_id,
                            error = %err,
                            "segment query failed, skipping"
                        );
                    }
                }
            }

            for vehicle in candidates {
                if let Some((position, speed)) = sample(provider, &vehicle) {
                    if let Some(event) =
                        zone.check_vehicle(&vehicle, position, speed, tick, &mut self.plates)
                    {
                        events.push(event);
                    }
                }
            }
        }
    }

    /// Consume the provider's per-zone region queries. Any zone whose query
    /// fails is scanned in full for this tick only; the query is retried
    /// next tick.
    fn tick_subscription<P: TelemetryProvider>(
        &mut self,
        tick: Tick,
        provider: &P,
        events: &mut Vec<ViolationEvent>,
    ) {
        for zone in &mut self.zones {
            match provider.nearby_vehicles(zone.id()) {
                Ok(snapshot) => {
                    if self.subscription_outages.remove(zone.id()) {
                        debug!(zone_id = %zone.id(), "zone subscription recovered");
                    }
                    for (vehicle, state) in &snapshot {
                        if let Some(event) = zone.check_vehicle(
                            vehicle,
                            state.position,
                            state.speed,
                            tick,
                            &mut self.plates,
                        ) {
                            events.push(event);
                        }
                    }
                }
                Err(err) => {
                    if self.subscription_outages.insert(zone.id().to_string()) {
                        warn!(
                            zone_id = %zone.id(),
                            error = %err,
                            "zone subscription failed, falling back to full scan"
                        );
                    }
                    scan_zone(zone, &mut self.plates, tick, provider, events);
                }
            }
        }
    }

    /// Check every vehicle against every zone. Telemetry is sampled once
    /// per tick and the snapshot shared across zones.
    fn tick_full_scan<P: TelemetryProvider>(
        &mut self,
        tick: Tick,
        provider: &P,
        events: &mut Vec<ViolationEvent>,
    ) {
        let vehicles = match provider.list_vehicles() {
            Ok(vehicles) => vehicles,
            Err(err) => {
                warn!(error = %err, "vehicle enumeration failed, skipping tick");
                return;
            }
        };

        let mut snapshots = Vec::with_capacity(vehicles.len());
        for vehicle in vehicles {
            if let Some((position, speed)) = sample(provider, &vehicle) {
                snapshots.push((vehicle, position, speed));
            }
        }

        for zone in &mut self.zones {
            for (vehicle, position, speed) in &snapshots {
                if let Some(event) =
                    zone.check_vehicle(vehicle, *position, *speed, tick, &mut self.plates)
                {
                    events.push(event);
                }
            }
        }
    }
}

/// Full scan of a single zone, used as the subscription fallback path.
fn scan_zone<P: TelemetryProvider>(
    zone: &mut RadarZone,
    plates: &mut PlateRegistry,
    tick: Tick,
    provider: &P,
    events: &mut Vec<ViolationEvent>,
) {
    let vehicles = match provider.list_vehicles() {
        Ok(vehicles) => vehicles,
        Err(err) => {
            warn!(zone_id = %zone.id(), error = %err, "vehicle enumeration failed, skipping zone this tick");
            return;
        }
    };

    for vehicle in vehicles {
        if let Some((position, speed)) = sample(provider, &vehicle) {
            if let Some(event) = zone.check_vehicle(&vehicle, position, speed, tick, plates) {
                events.push(event);
            }
        }
    }
}

/// Position and speed for one vehicle, or `None` if it should be skipped.
///
/// A vehicle that left the simulation between enumeration and this query
/// is skipped silently; any other telemetry failure is logged and the
/// vehicle skipped for this tick.
fn sample<P: TelemetryProvider>(provider: &P, vehicle: &VehicleId) -> Option<(Point, f64)> {
    let position = match provider.position(vehicle) {
        Ok(position) => position,
        Err(err) if err.is_gone() => return None,
        Err(err) => {
            warn!(vehicle_id = %vehicle, error = %err, "position query failed, skipping vehicle");
            return None;
        }
    };

    let speed = match provider.speed(vehicle) {
        Ok(speed) => speed,
        Err(err) if err.is_gone() => return None,
        Err(err) => {
            warn!(vehicle_id = %vehicle, error = %err, "speed query failed, skipping vehicle");
            return None;
        }
    };

    Some((position, speed))
}
