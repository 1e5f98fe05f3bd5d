//! # 服务商目录
//!
//! providers.yaml 的静态服务商列表，仅用于管理端展示

use crate::error::{ProxyError, Result};
use crate::types::{ApiUrl, ModelId, ModelProvider};
use serde::Deserialize;
use std::path::Path;

/// 一个静态配置的服务商条目
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub provider: ModelProvider,
    pub models: Vec<ModelId>,
    pub api_url: ApiUrl,
}

/// 服务商目录
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog(Vec<ProviderEntry>);

#[derive(Debug, Deserialize)]
struct RawProviderEntry {
    provider: String,
    #[serde(default)]
    models: Vec<String>,
    api_url: String,
}

impl ProviderCatalog {
    /// 从 providers.yaml 加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProxyError::config_with_source(
                format!("读取服务商目录失败: {}", path.as_ref().display()),
                e,
            )
        })?;
        Self::from_yaml(&data)
    }

    /// 从 YAML 文本解析（测试入口）
    pub fn from_yaml(data: &str) -> Result<Self> {
        let raw: Vec<RawProviderEntry> = serde_yaml::from_str(data)
            .map_err(|e| ProxyError::config_with_source("服务商目录YAML解析失败", e))?;

        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            let provider = ModelProvider::parse(&entry.provider)?;
            let mut models = Vec::with_capacity(entry.models.len());
            for model in entry.models {
                models.push(ModelId::new(model)?);
            }
            entries.push(ProviderEntry {
                provider,
                models,
                api_url: ApiUrl::new(&entry.api_url)?,
            });
        }
        Ok(Self(entries))
    }

    #[must_use]
    pub fn all(&self) -> &[ProviderEntry] {
        &self.0
    }
}
