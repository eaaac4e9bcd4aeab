//! # Violation Sink
//!
//! 违规事件落盘与上报模块。
//!
//! 负责：
//! - 同步追加本地违规日志，写入失败立即终止运行
//! - 尽力而为的 HTTP 上报（主地址连接失败后改试备用地址一次）
//! - 有界队列隔离上报延迟，不阻塞 tick 主链路

pub mod collector;
pub mod handle;
pub mod journal;
pub mod metrics;
pub mod sink;

pub use collector::{CollectorClient, DeliveryTarget};
pub use contracts::{EventSink, ViolationEvent};
pub use handle::DeliveryHandle;
pub use journal::ViolationJournal;
pub use metrics::{DeliveryMetrics, DeliverySnapshot};
pub use sink::ViolationSink;
