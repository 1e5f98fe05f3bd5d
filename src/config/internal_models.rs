//! # 内部分类模型清单
//!
//! 从 models.yaml 读取，进程启动时加载一次，此后只读共享

use crate::error::{ProxyError, Result};
use crate::types::{InternalModelType, ModelId};
use serde::Deserialize;
use std::path::Path;

/// 一个可供防火墙引用的内部分类模型
#[derive(Debug, Clone, PartialEq)]
pub struct InternalModel {
    pub model: ModelId,
    pub model_type: InternalModelType,
}

/// 已加载的内部模型清单
#[derive(Debug, Clone, Default)]
pub struct InternalModels(Vec<InternalModel>);

#[derive(Debug, Deserialize)]
struct RawInternalModel {
    model: String,
    #[serde(rename = "type")]
    model_type: String,
}

impl InternalModels {
    /// 从 models.yaml 加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProxyError::config_with_source(
                format!("读取模型清单失败: {}", path.as_ref().display()),
                e,
            )
        })?;
        Self::from_yaml(&data)
    }

    /// 从 YAML 文本解析（测试入口）
    pub fn from_yaml(data: &str) -> Result<Self> {
        let raw: Vec<RawInternalModel> = serde_yaml::from_str(data)
            .map_err(|e| ProxyError::config_with_source("模型清单YAML解析失败", e))?;

        let mut models = Vec::with_capacity(raw.len());
        for entry in raw {
            models.push(InternalModel {
                model: ModelId::new(entry.model)?,
                model_type: InternalModelType::parse(&entry.model_type)?,
            });
        }
        Ok(Self(models))
    }

    /// 按模型ID查找
    #[must_use]
    pub fn get(&self, model: &ModelId) -> Option<&InternalModel> {
        self.0.iter().find(|m| &m.model == model)
    }

    #[must_use]
    pub fn all(&self) -> &[InternalModel] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
