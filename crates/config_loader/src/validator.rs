//! 配置校验模块
//!
//! 校验规则：
//! - 至少配置一个测速区域
//! - zone id 非空且唯一
//! - 区域中心坐标有限
//! - speed_limit > 0，detection_radius > 0
//! - sweep_interval > 0
//! - journal.path 非空
//! - collector URL 必须是 http(s)，timeout_ms / queue_capacity > 0

use std::collections::HashSet;

use contracts::{RadarBlueprint, RadarError};

/// 校验 RadarBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RadarBlueprint) -> Result<(), RadarError> {
    validate_zones(blueprint)?;
    validate_engine(blueprint)?;
    validate_journal(blueprint)?;
    validate_collector(blueprint)?;
    Ok(())
}

/// 校验测速区域
fn validate_zones(blueprint: &RadarBlueprint) -> Result<(), RadarError> {
    if blueprint.zones.is_empty() {
        return Err(RadarError::config_validation(
            "zones",
            "at least one radar zone must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, zone) in blueprint.zones.iter().enumerate() {
        if zone.id.is_empty() {
            return Err(RadarError::config_validation(
                format!("zones[{idx}].id"),
                "zone id cannot be empty",
            ));
        }

        if !seen.insert(&zone.id) {
            return Err(RadarError::config_validation(
                format!("zones[id={}]", zone.id),
                "duplicate zone id",
            ));
        }

        if !zone.x.is_finite() || !zone.y.is_finite() {
            return Err(RadarError::config_validation(
                format!("zones[{}].x/y", zone.id),
                format!("zone center must be finite, got ({}, {})", zone.x, zone.y),
            ));
        }

        if !zone.speed_limit.is_finite() || zone.speed_limit <= 0.0 {
            return Err(RadarError::config_validation(
                format!("zones[{}].speed_limit", zone.id),
                format!("speed_limit must be > 0, got {}", zone.speed_limit),
            ));
        }

        if !zone.detection_radius.is_finite() || zone.detection_radius <= 0.0 {
            return Err(RadarError::config_validation(
                format!("zones[{}].detection_radius", zone.id),
                format!(
                    "detection_radius must be > 0, got {}",
                    zone.detection_radius
                ),
            ));
        }
    }
    Ok(())
}

/// 校验检测引擎参数
fn validate_engine(blueprint: &RadarBlueprint) -> Result<(), RadarError> {
    if blueprint.engine.sweep_interval == 0 {
        return Err(RadarError::config_validation(
            "engine.sweep_interval",
            "sweep_interval must be > 0",
        ));
    }
    Ok(())
}

/// 校验本地日志配置
fn validate_journal(blueprint: &RadarBlueprint) -> Result<(), RadarError> {
    if blueprint.journal.path.as_os_str().is_empty() {
        return Err(RadarError::config_validation(
            "journal.path",
            "journal path cannot be empty",
        ));
    }
    Ok(())
}

/// 校验远端上报配置
fn validate_collector(blueprint: &RadarBlueprint) -> Result<(), RadarError> {
    let Some(collector) = &blueprint.collector else {
        return Ok(());
    };

    validate_url("collector.primary_url", &collector.primary_url)?;
    if let Some(fallback) = &collector.fallback_url {
        validate_url("collector.fallback_url", fallback)?;
    }

    if collector.timeout_ms == 0 {
        return Err(RadarError::config_validation(
            "collector.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }

    if collector.queue_capacity == 0 {
        return Err(RadarError::config_validation(
            "collector.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }

    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<(), RadarError> {
    if url.is_empty() {
        return Err(RadarError::config_validation(field, "url cannot be empty"));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(RadarError::config_validation(
            field,
            format!("url must start with http:// or https://, got '{url}'"),
        ));
    }
    Ok(())
}
