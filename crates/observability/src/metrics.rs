//! 雷达指标收集模块
//!
//! 基于 `ViolationEvent` 与每 tick 计数收集运行指标，并在内存中聚合
//! 生成运行结束时的摘要。

use std::collections::HashMap;

use contracts::ViolationEvent;
use metrics::{counter, gauge, histogram};

/// 每个 tick 记录一次引擎计数。
///
/// `checks` 与 `violations` 为本 tick 的增量，不是累计值。
pub fn record_tick(tick: u64, checks: u64, violations: u64) {
    counter!("speed_radar_ticks_total").increment(1);
    gauge!("speed_radar_last_tick").set(tick as f64);

    if checks > 0 {
        counter!("speed_radar_checks_total").increment(checks);
    }
    if violations > 0 {
        counter!("speed_radar_violations_total").increment(violations);
    }
}

/// 每条违规事件记录一次。
pub fn record_violation(event: &ViolationEvent) {
    counter!(
        "speed_radar_zone_violations_total",
        "zone_id" => event.zone_id.clone()
    )
    .increment(1);
    histogram!("speed_radar_overspeed_kmh").record(event.overspeed_kmh);
    histogram!("speed_radar_speed_kmh").record(event.speed_kmh);
}

/// 记录当前处于降级（逐区域全量扫描）状态的区域数。
pub fn record_zone_fallbacks(count: usize) {
    gauge!("speed_radar_zones_in_fallback").set(count as f64);
}

/// 违规指标聚合器
///
/// 在内存中聚合违规事件，便于输出运行结束摘要。
#[derive(Debug, Clone, Default)]
pub struct ViolationAggregator {
    /// 违规总数
    pub total_violations: u64,

    /// 各区域违规次数
    pub zone_counts: HashMap<String, u64>,

    /// 超速幅度统计 (km/h)
    pub overspeed_stats: RunningStats,

    /// 违规时速统计 (km/h)
    pub speed_stats: RunningStats,
}

impl ViolationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合入一条违章事件
    pub fn update(&mut self, event: &ViolationEvent) {
        self.total_violations += 1;
        *self.zone_counts.entry(event.zone_id.clone()).or_insert(0) += 1;
        self.overspeed_stats.push(event.overspeed_kmh);
        self.speed_stats.push(event.speed_kmh);
    }

    /// 汇总为运行报告
    pub fn summary(&self) -> ViolationSummary {
        ViolationSummary {
            total_violations: self.total_violations,
            zone_counts: self.zone_counts.clone(),
            overspeed_kmh: StatsSummary::from(&self.overspeed_stats),
            speed_kmh: StatsSummary::from(&self.speed_stats),
        }
    }
}

/// 违规摘要
#[derive(Debug, Clone, Default)]
pub struct ViolationSummary {
    pub total_violations: u64,
    pub zone_counts: HashMap<String, u64>,
    pub overspeed_kmh: StatsSummary,
    pub speed_kmh: StatsSummary,
}

impl std::fmt::Display for ViolationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Violation Summary ===")?;
        writeln!(f, "Total violations: {}", self.total_violations)?;
        writeln!(f, "Overspeed (km/h): {}", self.overspeed_kmh)?;
        writeln!(f, "Speed (km/h): {}", self.speed_kmh)?;

        if !self.zone_counts.is_empty() {
            writeln!(f, "Violations per zone:")?;
            let mut zones: Vec<_> = self.zone_counts.iter().collect();
            zones.sort_by(|a, b| a.0.cmp(b.0));
            for (zone, count) in zones {
                writeln!(f, "  {}: {}", zone, count)?;
            }
        }

        Ok(())
    }
}

/// 数值分布摘要 (min/max/mean/std)
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "mean={:.1} min={:.1} max={:.1} std={:.1} (n={})",
            self.mean, self.min, self.max, self.std_dev, self.count
        )
    }
}

/// 在线统计计算器 (Welford)
///
/// 单遍累积 min/max/均值/方差，不保存样本。
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        match self.count {
            0 => 0.0,
            _ => self.mean,
        }
    }

    /// 样本方差，少于两个样本时为 0
    pub fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / (self.count - 1) as f64
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
