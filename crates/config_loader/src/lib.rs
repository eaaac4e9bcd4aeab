//! # Config Loader
//!
//! 雷达配置的加载入口。
//!
//! 负责：
//! - 读取 TOML / JSON 配置文件（格式由扩展名决定）
//! - 反序列化为 `RadarBlueprint` 并校验
//! - 序列化回 TOML / JSON 文本
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("radars.toml")).unwrap();
//! println!("Zones: {}", blueprint.zones.len());
//! ```

mod parser;
mod validator;

pub use contracts::RadarBlueprint;
pub use parser::ConfigFormat;

use contracts::RadarError;
use std::path::Path;

/// 配置加载器，全部为静态方法
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从文件加载并校验配置。
    ///
    /// # Errors
    /// 读取失败、扩展名无法识别、反序列化失败或校验失败。
    pub fn load_from_path(path: &Path) -> Result<RadarBlueprint, RadarError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// 从字符串加载并校验配置。
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RadarBlueprint, RadarError> {
        let bp = parser::parse(content, format)?;
        validator::validate(&bp)?;
        Ok(bp)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml(blueprint: &RadarBlueprint) -> Result<String, RadarError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| RadarError::config_parse(format!("serialize to TOML failed: {e}")))
    }

    /// 序列化为 JSON 文本
    pub fn to_json(blueprint: &RadarBlueprint) -> Result<String, RadarError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| RadarError::config_parse(format!("serialize to JSON failed: {e}")))
    }
}
