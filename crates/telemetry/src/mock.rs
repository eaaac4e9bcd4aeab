//! Mock 遥测源
//!
//! 脚本化的 `TelemetryProvider` 实现，用于单元测试与离线演示运行，
//! 支持注入失败场景（实体消失、订阅中断）。

use std::collections::{BTreeMap, HashMap, HashSet};

use contracts::{Point, TelemetryError, TelemetryProvider, VehicleId, VehicleSnapshot, ZoneConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

/// 一条道路段：每条车道是一串折线采样点
#[derive(Debug, Clone, Default)]
struct MockSegment {
    lanes: Vec<Vec<Point>>,
}

/// 一辆受控车辆
#[derive(Debug, Clone)]
struct MockVehicle {
    position: Point,
    speed: f64,
    /// 所在道路段（直接放置的车辆为 None，不随 step 移动）
    segment: Option<String>,
    /// 沿 0 号车道折线的里程（米）
    offset: f64,
    /// 仍会被枚举，但状态查询即失败（模拟消失竞态）
    vanished: bool,
}

/// Mock 遥测源
///
/// 车辆与道路段按 id 排序存储，枚举顺序确定。
pub struct MockTelemetry {
    segments: BTreeMap<String, MockSegment>,
    vehicles: BTreeMap<String, MockVehicle>,
    /// 已登记的区域订阅 (zone_id -> 圆心与半径)
    subscriptions: HashMap<String, (Point, f64)>,
    /// 订阅通道中断的区域
    failed_subscriptions: HashSet<String>,
    /// 每 tick 对应的仿真时长（秒）
    tick_length: f64,
}

impl MockTelemetry {
    pub fn new() -> Self {
        Self {
            segments: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            subscriptions: HashMap::new(),
            failed_subscriptions: HashSet::new(),
            tick_length: 1.0,
        }
    }

    /// 构造一个可复现的演示世界。
    ///
    /// 每个区域铺一条沿 +x 方向、穿过圆心的直路，并在随机里程处放置
    /// `vehicles_per_zone` 辆车，速度为限速的 0.7 到 1.4 倍。
    pub fn demo_world(zones: &[ZoneConfig], vehicles_per_zone: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut world = Self::new();

        for (index, zone) in zones.iter().enumerate() {
            let segment_id = format!("seg_{index}");
            let half = 2.0 * zone.detection_radius + 100.0;
            let mut shape = Vec::new();
            let mut x = zone.x - half;
            while x <= zone.x + half {
                shape.push(Point::new(x, zone.y));
                x += 20.0;
            }
            let length = polyline_length(&shape);
            world.add_segment(&segment_id, vec![shape]);

            for n in 0..vehicles_per_zone {
                let offset = rng.random_range(0.0..length);
                let speed = zone.speed_limit * rng.random_range(0.7..1.4);
                world.add_vehicle(format!("veh_{index}_{n}"), &segment_id, offset, speed);
            }
        }

        world
    }

    pub fn set_tick_length(&mut self, seconds: f64) {
        self.tick_length = seconds;
    }

    pub fn add_segment(&mut self, id: impl Into<String>, lanes: Vec<Vec<Point>>) {
        self.segments.insert(id.into(), MockSegment { lanes });
    }

    /// 在某条段的 0 号车道上、给定里程处放置一辆车。
    pub fn add_vehicle(&mut self, id: impl Into<String>, segment: &str, offset: f64, speed: f64) {
        let id = id.into();
        let position = match self
            .segments
            .get(segment)
            .and_then(|s| s.lanes.first())
            .and_then(|shape| point_along(shape, offset))
        {
            Some(position) => position,
            None => {
                warn!(vehicle_id = %id, segment_id = %segment, "segment has no usable lane, placing vehicle at origin");
                Point::default()
            }
        };
        self.vehicles.insert(
            id,
            MockVehicle {
                position,
                speed,
                segment: Some(segment.to_string()),
                offset,
                vanished: false,
            },
        );
    }

    /// 直接在世界坐标处放置一辆车（不属于任何段，不随 step 移动）。
    pub fn place_vehicle(&mut self, id: impl Into<String>, position: Point, speed: f64) {
        self.vehicles.insert(
            id.into(),
            MockVehicle {
                position,
                speed,
                segment: None,
                offset: 0.0,
                vanished: false,
            },
        );
    }

    pub fn set_speed(&mut self, id: &str, speed: f64) {
        if let Some(vehicle) = self.vehicles.get_mut(id) {
            vehicle.speed = speed;
        }
    }

    pub fn remove_vehicle(&mut self, id: &str) {
        self.vehicles.remove(id);
    }

    /// 标记车辆消失：仍会出现在枚举结果里，但状态查询返回
    /// `EntityNotFound`。
    pub fn vanish(&mut self, id: &str) {
        if let Some(vehicle) = self.vehicles.get_mut(id) {
            vehicle.vanished = true;
        }
    }

    /// 使某区域的订阅通道中断（注册与查询都会失败）。
    pub fn fail_subscription(&mut self, zone_id: &str) {
        self.failed_subscriptions.insert(zone_id.to_string());
    }

    pub fn restore_subscription(&mut self, zone_id: &str) {
        self.failed_subscriptions.remove(zone_id);
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// 推进一个 tick：每辆在段上的车沿 0 号车道前进
    /// `speed * tick_length` 米，到达末端后回绕。
    pub fn step(&mut self) {
        for vehicle in self.vehicles.values_mut() {
            let Some(segment_id) = vehicle.segment.as_deref() else {
                continue;
            };
            let Some(shape) = self
                .segments
                .get(segment_id)
                .and_then(|s| s.lanes.first())
            else {
                continue;
            };
            let length = polyline_length(shape);
            if length <= 0.0 {
                continue;
            }
            vehicle.offset = (vehicle.offset + vehicle.speed * self.tick_length) % length;
            if let Some(position) = point_along(shape, vehicle.offset) {
                vehicle.position = position;
            }
        }
    }

    fn live_vehicle(&self, vehicle_id: &VehicleId) -> Result<&MockVehicle, TelemetryError> {
        match self.vehicles.get(vehicle_id.as_str()) {
            Some(vehicle) if !vehicle.vanished => Ok(vehicle),
            _ => Err(TelemetryError::entity_not_found(vehicle_id.as_str())),
        }
    }
}

impl Default for MockTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryProvider for MockTelemetry {
    fn list_vehicles(&self) -> Result<Vec<VehicleId>, TelemetryError> {
        Ok(self.vehicles.keys().map(|id| VehicleId::new(id)).collect())
    }

    fn vehicles_on_segment(&self, segment_id: &str) -> Result<Vec<VehicleId>, TelemetryError> {
        if !self.segments.contains_key(segment_id) {
            return Err(TelemetryError::segment_not_found(segment_id));
        }
        Ok(self
            .vehicles
            .iter()
            .filter(|(_, vehicle)| vehicle.segment.as_deref() == Some(segment_id))
            .map(|(id, _)| VehicleId::new(id))
            .collect())
    }

    fn position(&self, vehicle_id: &VehicleId) -> Result<Point, TelemetryError> {
        Ok(self.live_vehicle(vehicle_id)?.position)
    }

    fn speed(&self, vehicle_id: &VehicleId) -> Result<f64, TelemetryError> {
        Ok(self.live_vehicle(vehicle_id)?.speed)
    }

    fn list_segments(&self) -> Result<Vec<String>, TelemetryError> {
        Ok(self.segments.keys().cloned().collect())
    }

    fn lane_count(&self, segment_id: &str) -> Result<usize, TelemetryError> {
        self.segments
            .get(segment_id)
            .map(|segment| segment.lanes.len())
            .ok_or_else(|| TelemetryError::segment_not_found(segment_id))
    }

    fn lane_shape(&self, lane_id: &str) -> Result<Vec<Point>, TelemetryError> {
        let (segment_id, index) = lane_id
            .rsplit_once('_')
            .ok_or_else(|| TelemetryError::lane_not_found(lane_id))?;
        let index: usize = index
            .parse()
            .map_err(|_| TelemetryError::lane_not_found(lane_id))?;
        self.segments
            .get(segment_id)
            .and_then(|segment| segment.lanes.get(index))
            .cloned()
            .ok_or_else(|| TelemetryError::lane_not_found(lane_id))
    }

    fn subscribe_zone(
        &mut self,
        zone_id: &str,
        center: Point,
        radius: f64,
    ) -> Result<(), TelemetryError> {
        if self.failed_subscriptions.contains(zone_id) {
            return Err(TelemetryError::subscription(
                zone_id,
                "subscription channel unavailable",
            ));
        }
        self.subscriptions
            .insert(zone_id.to_string(), (center, radius));
        Ok(())
    }

    fn nearby_vehicles(
        &self,
        zone_id: &str,
    ) -> Result<HashMap<VehicleId, VehicleSnapshot>, TelemetryError> {
        if self.failed_subscriptions.contains(zone_id) {
            return Err(TelemetryError::subscription(
                zone_id,
                "subscription channel unavailable",
            ));
        }
        let (center, radius) = self
            .subscriptions
            .get(zone_id)
            .copied()
            .ok_or_else(|| TelemetryError::subscription(zone_id, "no active subscription"))?;

        Ok(self
            .vehicles
            .iter()
            .filter(|(_, vehicle)| {
                !vehicle.vanished && vehicle.position.distance_to(center) <= radius
            })
            .map(|(id, vehicle)| {
                (
                    VehicleId::new(id),
                    VehicleSnapshot {
                        position: vehicle.position,
                        speed: vehicle.speed,
                    },
                )
            })
            .collect())
    }
}

fn polyline_length(shape: &[Point]) -> f64 {
    shape.windows(2).map(|pair| pair[0].distance_to(pair[1])).sum()
}

/// 沿折线走 `offset` 米后的坐标；超出末端时停在末端。
fn point_along(shape: &[Point], offset: f64) -> Option<Point> {
    let (first, rest) = shape.split_first()?;
    if offset <= 0.0 || rest.is_empty() {
        return Some(*first);
    }

    let mut remaining = offset;
    let mut prev = *first;
    for next in rest {
        let span = prev.distance_to(*next);
        if span > 0.0 && remaining <= span {
            let t = remaining / span;
            return Some(Point::new(
                prev.x + (next.x - prev.x) * t,
                prev.y + (next.y - prev.y) * t,
            ));
        }
        remaining -= span;
        prev = *next;
    }
    Some(prev)
}
