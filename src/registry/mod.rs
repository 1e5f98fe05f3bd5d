//! # 模型注册表
//!
//! 逻辑模型名到上游绑定的并发映射，读写锁保护。
//! 对外只交出值拷贝，调用方不会观察到中间状态

use crate::error::{ProxyError, Result};
use crate::types::{ApiUrl, ModelId, ModelName, ModelProvider, ModelStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// 一条注册的模型绑定
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredModel {
    /// 客户端使用的逻辑名
    pub name: ModelName,
    /// 上游真实模型标识
    pub model: ModelId,
    /// 上游基础URL
    pub api_url: ApiUrl,
    pub provider: ModelProvider,
    pub status: ModelStatus,
    pub created_at: DateTime<Utc>,
}

/// 模型注册表
///
/// 写者独占，读者（lookup/list）共享；锁内不做任何IO
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, RegisteredModel>>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册模型，逻辑名唯一，重复注册失败
    pub fn register(&self, model: RegisteredModel) -> Result<()> {
        let mut models = self
            .models
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let key = model.name.as_str().to_string();
        if models.contains_key(&key) {
            return Err(ProxyError::validation(format!(
                "model with name {key} already exists"
            )));
        }
        models.insert(key, model);
        Ok(())
    }

    /// 按逻辑名查找，返回值拷贝
    #[must_use]
    pub fn lookup(&self, name: &ModelName) -> Option<RegisteredModel> {
        let models = self
            .models
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        models.get(name.as_str()).cloned()
    }

    /// 共享锁内拷贝出全部条目快照
    #[must_use]
    pub fn list(&self) -> Vec<RegisteredModel> {
        let models = self
            .models
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        models.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample(name: &str) -> RegisteredModel {
        RegisteredModel {
            name: ModelName::new(name).unwrap(),
            model: ModelId::new("gpt-4").unwrap(),
            api_url: ApiUrl::new("https://api.example/v1").unwrap(),
            provider: ModelProvider::OpenAi,
            status: ModelStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn register_then_lookup_returns_equal_value() {
        let registry = ModelRegistry::new();
        let model = sample("m1");
        registry.register(model.clone()).unwrap();

        let found = registry.lookup(&model.name).unwrap();
        assert_eq!(found, model);
    }

    #[test]
    fn duplicate_name_fails() {
        let registry = ModelRegistry::new();
        registry.register(sample("m1")).unwrap();
        assert!(registry.register(sample("m1")).is_err());
    }

    #[test]
    fn lookup_missing_returns_none() {
        let registry = ModelRegistry::new();
        assert!(registry.lookup(&ModelName::new("nope").unwrap()).is_none());
    }

    #[test]
    fn list_returns_independent_snapshot() {
        let registry = ModelRegistry::new();
        registry.register(sample("m1")).unwrap();
        registry.register(sample("m2")).unwrap();

        let snapshot = registry.list();
        assert_eq!(snapshot.len(), 2);

        // 快照独立于后续写入
        registry.register(sample("m3")).unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn concurrent_duplicate_register_has_exactly_one_winner() {
        let registry = Arc::new(ModelRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                registry.register(sample("race")).is_ok()
            }));
        }
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(registry.list().len(), 1);
    }
}
