//! RadarBlueprint - Config Loader 输出
//!
//! 描述完整的雷达配置：测速区域、检测策略、冷却参数、日志与上报路由。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{ms_to_kmh, Point};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的雷达配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 测速区域列表
    pub zones: Vec<ZoneConfig>,

    /// 检测引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 本地违章日志配置
    #[serde(default)]
    pub journal: JournalConfig,

    /// 远端上报配置 (可选，缺省时仅记录本地日志)
    #[serde(default)]
    pub collector: Option<CollectorConfig>,
}

/// 测速区域配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// 唯一标识符
    pub id: String,

    /// 区域中心 x 坐标 (米)
    pub x: f64,

    /// 区域中心 y 坐标 (米)
    pub y: f64,

    /// 限速 (m/s)，必须 > 0
    pub speed_limit: f64,

    /// 检测半径 (米)
    #[serde(default = "default_detection_radius")]
    pub detection_radius: f64,

    /// 人类可读描述 (可选)
    #[serde(default)]
    pub description: String,
}

fn default_detection_radius() -> f64 {
    80.0
}

impl ZoneConfig {
    /// Zone center as a point.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Speed limit in km/h, rounded to one decimal.
    #[inline]
    pub fn speed_limit_kmh(&self) -> f64 {
        ms_to_kmh(self.speed_limit)
    }
}

/// 检测策略
///
/// 三种策略产出完全相同的违章判定，只在遍历车辆的方式上不同。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// 只检查落在区域附近路段上的车辆 (默认)
    #[default]
    #[serde(rename = "edge")]
    EdgeBased,

    /// 依赖 provider 的区域订阅，失败时单区域单 tick 退化为全量扫描
    #[serde(rename = "subscription")]
    ContextSubscription,

    /// 每 tick 对所有车辆做全量扫描
    #[serde(rename = "full")]
    FullScan,
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EdgeBased => "edge",
            Self::ContextSubscription => "subscription",
            Self::FullScan => "full",
        };
        write!(f, "{name}")
    }
}

/// 检测引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 检测策略
    #[serde(default)]
    pub strategy: DetectionStrategy,

    /// 冷却窗口 (tick 数)：同一车辆在同一区域内重复违章的抑制时长
    #[serde(default = "default_cooldown_ticks")]
    pub cooldown_ticks: u64,

    /// 冷却表清扫周期 (tick 数)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,
}

fn default_cooldown_ticks() -> u64 {
    100
}

fn default_sweep_interval() -> u64 {
    500
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: DetectionStrategy::default(),
            cooldown_ticks: default_cooldown_ticks(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// 本地违章日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// 日志文件路径
    #[serde(default = "default_journal_path")]
    pub path: PathBuf,
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("speed_violations.log")
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: default_journal_path(),
        }
    }
}

/// 远端上报配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 主上报地址 (基础 URL，不含 /api 路径)
    pub primary_url: String,

    /// 备用上报地址 (可选，仅在主地址不可达时尝试一次)
    #[serde(default)]
    pub fallback_url: Option<String>,

    /// 单次请求超时 (毫秒)
    #[serde(default = "default_collector_timeout_ms")]
    pub timeout_ms: u64,

    /// 后台投递队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_collector_timeout_ms() -> u64 {
    1000
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            primary_url: String::new(),
            fallback_url: None,
            timeout_ms: default_collector_timeout_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl RadarBlueprint {
    /// Look up a zone by id.
    pub fn zone(&self, id: &str) -> Option<&ZoneConfig> {
        self.zones.iter().find(|zone| zone.id == id)
    }
}
