//! One-time mapping from zone geometry to nearby road segments.
//!
//! Walks the full topology once per zone and keeps every segment with at
//! least one lane-shape point inside the detection circle. Edge-based
//! detection then only ever queries those segments.

use contracts::{TelemetryError, TelemetryProvider};
use tracing::debug;

use crate::zone::RadarZone;

/// Scan the topology for segments intersecting the zone's circle.
///
/// Internal junction segments (ids starting with `:`) are skipped. One
/// matching lane point is enough to include a segment; remaining lanes are
/// not inspected. Per-lane and per-segment query misses are skipped so a
/// single stale topology entry cannot fail the whole scan.
///
/// # Errors
/// Propagates only a failed segment enumeration, which leaves the zone
/// unresolved.
pub(crate) fn resolve_zone_segments<P: TelemetryProvider>(
    zone: &RadarZone,
    provider: &P,
) -> Result<Vec<String>, TelemetryError> {
    let segments = provider.list_segments()?;
    let mut nearby = Vec::new();

    for segment_id in segments {
        // Junction-internal segments
        if segment_id.starts_with(':') {
            continue;
        }

        let lane_count = match provider.lane_count(&segment_id) {
            Ok(count) => count,
            Err(err) if err.is_gone() => continue,
            Err(err) => {
                debug!(zone_id = %zone.id(), segment_id = %segment_id, error = %err, "lane count query failed, skipping segment");
                continue;
            }
        };

        'lanes: for lane_index in 0..lane_count {
            let lane_id = format!("{segment_id}_{lane_index}");
            let shape = match provider.lane_shape(&lane_id) {
                Ok(shape) => shape,
                Err(err) if err.is_gone() => continue,
                Err(err) => {
                    debug!(zone_id = %zone.id(), lane_id = %lane_id, error = %err, "lane shape query failed, skipping lane");
                    continue;
                }
            };

            for point in shape {
                if zone.contains(point) {
                    nearby.push(segment_id.clone());
                    break 'lanes;
                }
            }
        }
    }

    Ok(nearby)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Point, ZoneConfig};
    use telemetry::MockTelemetry;

    fn zone_at(x: f64, y: f64, radius: f64) -> RadarZone {
        let config = ZoneConfig {
            id: "radar_test".into(),
            x,
            y,
            speed_limit: 10.0,
            detection_radius: radius,
            description: String::new(),
        };
        RadarZone::new(&config, 100, None)
    }

    fn straight_lane(y: f64, from_x: f64, to_x: f64) -> Vec<Point> {
        let mut shape = Vec::new();
        let mut x = from_x;
        while x <= to_x {
            shape.push(Point::new(x, y));
            x += 10.0;
        }
        shape
    }

    #[test]
    fn test_keeps_segments_touching_the_circle() {
        let mut provider = MockTelemetry::new();
        provider.add_segment("seg_near", vec![straight_lane(100.0, 0.0, 200.0)]);
        provider.add_segment("seg_far", vec![straight_lane(900.0, 0.0, 200.0)]);

        let zone = zone_at(100.0, 100.0, 50.0);
        let nearby = resolve_zone_segments(&zone, &provider).unwrap();

        assert_eq!(nearby, vec!["seg_near".to_string()]);
    }

    #[test]
    fn test_skips_junction_segments() {
        let mut provider = MockTelemetry::new();
        provider.add_segment(":junction_0", vec![straight_lane(100.0, 0.0, 200.0)]);
        provider.add_segment("seg_near", vec![straight_lane(100.0, 0.0, 200.0)]);

        let zone = zone_at(100.0, 100.0, 50.0);
        let nearby = resolve_zone_segments(&zone, &provider).unwrap();

        assert_eq!(nearby, vec!["seg_near".to_string()]);
    }

    #[test]
    fn test_one_lane_hit_is_enough() {
        // Both lanes cross the circle; the segment must appear once.
        let mut provider = MockTelemetry::new();
        provider.add_segment(
            "seg_two_lanes",
            vec![
                straight_lane(98.0, 0.0, 200.0),
                straight_lane(102.0, 0.0, 200.0),
            ],
        );

        let zone = zone_at(100.0, 100.0, 50.0);
        let nearby = resolve_zone_segments(&zone, &provider).unwrap();

        assert_eq!(nearby.len(), 1);
    }

    #[test]
    fn test_empty_topology_resolves_empty() {
        let provider = MockTelemetry::new();
        let zone = zone_at(100.0, 100.0, 50.0);
        let nearby = resolve_zone_segments(&zone, &provider).unwrap();
        assert!(nearby.is_empty());
    }
}
