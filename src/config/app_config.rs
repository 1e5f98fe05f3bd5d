//! # 应用配置结构

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 分类推理服务配置
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// YAML 清单路径
    #[serde(default)]
    pub manifests: ManifestPaths,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接URL（sqlite:// 或 postgres://）
    pub url: String,
}

/// 分类推理服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// 分类端点URL
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,
}

/// 三个 YAML 清单的路径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestPaths {
    /// 内部分类模型清单
    #[serde(default = "default_internal_models_path")]
    pub internal_models: String,
    /// 服务商目录
    #[serde(default = "default_providers_path")]
    pub providers: String,
    /// 防火墙链配置
    #[serde(default = "default_firewall_path")]
    pub firewall: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_classifier_endpoint() -> String {
    "http://localhost:8000/api/v1/models/text/classification".to_string()
}

fn default_internal_models_path() -> String {
    "models.yaml".to_string()
}

fn default_providers_path() -> String {
    "providers.yaml".to_string()
}

fn default_firewall_path() -> String {
    "config.yaml".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_classifier_endpoint(),
        }
    }
}

impl Default for ManifestPaths {
    fn default() -> Self {
        Self {
            internal_models: default_internal_models_path(),
            providers: default_providers_path(),
            firewall: default_firewall_path(),
        }
    }
}

impl AppConfig {
    /// 校验配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(crate::config_error!("数据库URL不能为空"));
        }
        if self.classifier.endpoint.is_empty() {
            return Err(crate::config_error!("分类端点不能为空"));
        }
        if self.server.port == 0 {
            return Err(crate::config_error!("服务器端口必须大于0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml_with_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.classifier.endpoint,
            "http://localhost:8000/api/v1/models/text/classification"
        );
        assert_eq!(config.manifests.firewall, "config.yaml");
        config.validate().unwrap();
    }

    #[test]
    fn empty_database_url_is_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            url = ""
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
