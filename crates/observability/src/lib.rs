//! # Observability
//!
//! Tracing 初始化与 Prometheus 指标导出。
//!
//! ## 提供
//!
//! - 三种日志格式 (Pretty / Compact / JSON)，`RUST_LOG` 优先于默认级别
//! - 可选的 Prometheus HTTP 导出端口
//! - 违章事件的内存聚合与运行摘要 ([`ViolationAggregator`])
//!
//! ## 用法
//!
//! ```ignore
//! use observability::{init_with_config, LogFormat, ObservabilityConfig};
//!
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     metrics_port: Some(9000),
//!     fallback_level: "info".to_string(),
//! })?;
//!
//! // 每个 tick 记录一次
//! observability::record_tick(tick, checks_delta, events.len() as u64);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_tick, record_violation, record_zone_fallbacks, RunningStats, StatsSummary,
    ViolationAggregator, ViolationSummary,
};

/// Tracing 与指标导出的开关集合
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志输出格式
    pub log_format: LogFormat,
    /// Prometheus 导出端口，None 表示不导出
    pub metrics_port: Option<u16>,
    /// `RUST_LOG` 未设置时生效的级别
    pub fallback_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_port: None,
            fallback_level: "info".to_string(),
        }
    }
}

/// 日志输出样式
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// 面向终端的多行格式
    #[default]
    Pretty,
    /// 单行紧凑格式
    Compact,
    /// 结构化 JSON 行
    Json,
}

/// 以默认配置初始化（Pretty 日志，指标导出禁用）
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 按给定配置初始化日志与指标
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.fallback_level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init(),
    }
    .context("Failed to set the global tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        install_prometheus(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "observability ready"
    );

    Ok(())
}

/// 只启动 Prometheus 导出端口，不初始化全局 tracing
///
/// 用于 Tracing 已在入口处初始化、指标端口在之后才确定的场景。
pub fn serve_metrics(port: u16) -> Result<()> {
    install_prometheus(port)
}

fn install_prometheus(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to start the Prometheus exporter on port {port}"))?;

    tracing::info!(port, "Prometheus exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_export_nothing() {
        let config = ObservabilityConfig::default();
        assert!(config.metrics_port.is_none(), "no exporter unless asked for");
        assert!(matches!(config.log_format, LogFormat::Pretty));
        assert_eq!(config.fallback_level, "info");
    }
}
