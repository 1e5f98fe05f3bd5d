//! # 配置管理模块
//!
//! 处理应用配置加载、校验和三个 YAML 清单的解析

mod app_config;
mod internal_models;
mod providers;

pub use app_config::{AppConfig, ClassifierConfig, DatabaseConfig, ManifestPaths, ServerConfig};
pub use internal_models::{InternalModel, InternalModels};
pub use providers::{ProviderCatalog, ProviderEntry};

use crate::error::Result;
use std::env;
use std::path::Path;

/// 加载应用配置文件
///
/// 路径取 `GUARD_PROXY_CONFIG` 环境变量，未设置时使用 `config/proxy.toml`
pub fn load_config() -> Result<AppConfig> {
    let config_file =
        env::var("GUARD_PROXY_CONFIG").unwrap_or_else(|_| "config/proxy.toml".to_string());

    if !Path::new(&config_file).exists() {
        return Err(crate::config_error!("配置文件不存在: {}", config_file));
    }

    let config_content = std::fs::read_to_string(&config_file)
        .map_err(|e| crate::error::ProxyError::config_with_source("读取配置文件失败", e))?;

    let config: AppConfig = toml::from_str(&config_content)
        .map_err(|e| crate::error::ProxyError::config_with_source("TOML解析失败", e))?;

    config.validate()?;

    Ok(config)
}
