//! # Telemetry
//!
//! 遥测源模块。
//!
//! 负责：
//! - 提供 `TelemetryProvider` 的离线实现
//! - 脚本化道路拓扑与车辆状态
//! - 注入失败场景（实体消失、订阅中断）
//! - 构造可复现的演示世界

pub mod mock;

pub use contracts::{TelemetryProvider, VehicleSnapshot};
pub use mock::MockTelemetry;
