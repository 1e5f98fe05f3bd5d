//! # 防火墙链配置
//!
//! 从 config.yaml 加载有序的过滤器清单，加载后不可变。
//! 引用的分类模型必须在模型清单中存在，阈值必须落在 [0,1]

use super::rule::Firewall;
use crate::config::InternalModels;
use crate::error::{ProxyError, Result};
use crate::types::FirewallType;
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

/// 防火墙链配置，按声明顺序排列
#[derive(Debug, Clone, Default)]
pub struct FirewallConfig {
    pub name: String,
    pub firewalls: Vec<Firewall>,
}

#[derive(Debug, Deserialize)]
struct RawFirewall {
    enabled: bool,
    /// 缺省时加载期生成
    id: Option<Uuid>,
    #[serde(rename = "type")]
    firewall_type: String,
    model: String,
    blocking_threshold: f64,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    name: String,
    #[serde(default)]
    firewalls: Vec<RawFirewall>,
}

impl FirewallConfig {
    /// 从 config.yaml 加载
    pub fn load<P: AsRef<Path>>(path: P, models: &InternalModels) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProxyError::config_with_source(
                format!("读取防火墙配置失败: {}", path.as_ref().display()),
                e,
            )
        })?;
        Self::from_yaml(&data, models)
    }

    /// 从 YAML 文本解析（测试入口）
    pub fn from_yaml(data: &str, models: &InternalModels) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(data)
            .map_err(|e| ProxyError::config_with_source("防火墙配置YAML解析失败", e))?;

        let mut firewalls = Vec::with_capacity(raw.firewalls.len());
        for rf in raw.firewalls {
            let firewall_type = FirewallType::parse(&rf.firewall_type)
                .map_err(|e| crate::config_error!("invalid firewall type: {}", e))?;

            let model_id = crate::types::ModelId::new(rf.model)
                .map_err(|e| crate::config_error!("invalid firewall model: {}", e))?;
            let model = models.get(&model_id).ok_or_else(|| {
                crate::config_error!("firewall model '{}' is not in the model manifest", model_id)
            })?;

            if !(0.0..=1.0).contains(&rf.blocking_threshold) {
                return Err(crate::config_error!(
                    "blocking_threshold must be between 0 and 1, got {}",
                    rf.blocking_threshold
                ));
            }

            firewalls.push(Firewall {
                enabled: rf.enabled,
                id: rf.id.unwrap_or_else(Uuid::new_v4),
                firewall_type,
                model: model.clone(),
                blocking_threshold: rf.blocking_threshold,
            });
        }

        Ok(Self {
            name: raw.name,
            firewalls,
        })
    }
}
