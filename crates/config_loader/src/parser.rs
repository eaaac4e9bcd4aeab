//! 雷达配置的反序列化：TOML 为主，JSON 备选。

use std::path::Path;

use contracts::{RadarBlueprint, RadarError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 从文件路径推断格式，无法识别时报错
    pub fn from_path(path: &Path) -> Result<Self, RadarError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            RadarError::config_parse("cannot determine config format: path has no extension")
        })?;

        Self::from_extension(ext).ok_or_else(|| {
            RadarError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

/// 按给定格式反序列化配置内容
pub fn parse(content: &str, format: ConfigFormat) -> Result<RadarBlueprint, RadarError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error("TOML", e)),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_error("JSON", e)),
    }
}

fn parse_error(label: &str, e: impl std::error::Error + Send + Sync + 'static) -> RadarError {
    RadarError::ConfigParse {
        message: format!("{label} parse error: {e}"),
        source: Some(Box::new(e)),
    }
}
