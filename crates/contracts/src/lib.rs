//! # Contracts
//!
//! 模块间的接口契约（ICD）：跨 crate 的数据结构与 trait 统一冻结在这里。
//! 业务 crate 只能依赖本 crate，禁止反向依赖。
//!
//! ## Time Model
//! - The simulation advances in discrete ticks (`u64`, starting at 0)
//! - Every telemetry query refers to the current tick; there is no wall-clock
//!   coupling anywhere in the detection path

mod blueprint;
mod error;
mod event;
mod point;
mod sink;
mod telemetry;
mod vehicle_id;

pub use blueprint::*;
pub use error::*;
pub use event::{ms_to_kmh, Tick, ViolationEvent};
pub use point::Point;
pub use sink::{EventSink, LocalEventSink};
pub use telemetry::{TelemetryProvider, VehicleSnapshot};
pub use vehicle_id::VehicleId;
