//! Zone membership tests: bounding-box prefilter plus exact circle check.

use contracts::Point;

/// Axis-aligned bounding box circumscribing a detection circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundingBox {
    /// Box spanning `center ± radius` on both axes.
    pub fn around(center: Point, radius: f64) -> Self {
        Self {
            min_x: center.x - radius,
            min_y: center.y - radius,
            max_x: center.x + radius,
            max_y: center.y + radius,
        }
    }

    /// Box membership, edges inclusive.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Full zone membership test.
///
/// The box rejects most points with four comparisons; only survivors pay
/// for the squared-distance circle test. A point exactly on the circle
/// boundary counts as inside.
#[inline]
pub fn in_zone(center: Point, radius: f64, bbox: &BoundingBox, p: Point) -> bool {
    if !bbox.contains(p) {
        return false;
    }
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    dx * dx + dy * dy <= radius * radius
}
