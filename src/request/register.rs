//! # 模型注册请求解析

use crate::error::Result;
use crate::registry::RegisteredModel;
use crate::types::{ApiUrl, ModelId, ModelName, ModelProvider, ModelStatus};
use chrono::Utc;
use serde::Deserialize;

/// 注册请求体的原始形态
#[derive(Debug, Deserialize)]
pub struct RawRegisterRequest {
    pub name: String,
    pub model: String,
    pub api_url: String,
    pub provider: String,
    /// 缺省为 active
    pub status: Option<String>,
}

impl RawRegisterRequest {
    /// 校验并转换为注册条目
    pub fn parse(self) -> Result<RegisteredModel> {
        let status = match self.status.as_deref() {
            Some(raw) => ModelStatus::parse(raw)?,
            None => ModelStatus::Active,
        };

        Ok(RegisteredModel {
            name: ModelName::new(self.name)?,
            model: ModelId::new(self.model)?,
            api_url: ApiUrl::new(&self.api_url)?,
            provider: ModelProvider::parse(&self.provider)?,
            status,
            created_at: Utc::now(),
        })
    }
}
