//! # Detection Engine
//!
//! 超速检测引擎：雷达区域几何、冷却去重、车牌登记与三种检测策略。
//!
//! 负责：
//! - 区域命中判定（包围盒粗筛 + 圆形精筛）
//! - 每区域冷却窗口去重与周期清扫
//! - 三种可互换的检测策略（edge / subscription / full）
//! - 输出 `ViolationEvent`
//!
//! ## 使用示例
//!
//! ```ignore
//! use detection::{DetectionEngine, PlateRegistry};
//!
//! let mut engine = DetectionEngine::from_blueprint(&blueprint, Some("run-1"), PlateRegistry::new());
//! engine.prepare(&mut provider)?;
//!
//! for tick in 0..3600 {
//!     for event in engine.tick(tick, &provider) {
//!         // Journal and forward the violation
//!     }
//! }
//! ```

mod cooldown;
mod engine;
mod geometry;
mod plates;
mod resolver;
mod zone;

pub use engine::{DetectionEngine, EngineStats};
pub use plates::PlateRegistry;
pub use zone::{RadarZone, ZoneStats};

// Re-export contracts types
pub use contracts::{DetectionStrategy, ViolationEvent};
