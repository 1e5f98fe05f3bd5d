//! # 分类推理客户端
//!
//! 调用外部分类推理服务，把文本变成 (标签, 概率) 对。
//! 防火墙通过 `Classify` trait 使用它，测试里用桩实现替换

use crate::config::InternalModel;
use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// 分类结果：labels 与 probabilities 为平行数组
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Classification {
    pub labels: Vec<String>,
    pub probabilities: Vec<f64>,
    #[serde(default)]
    pub model_id: String,
}

impl Classification {
    /// 配对遍历标签与概率
    ///
    /// 两个数组长度不一致时多出的一侧被忽略，不会panic
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.iter().copied())
    }
}

/// 分类服务接入点
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(&self, model: &InternalModel, text: &str) -> Result<Classification>;
}

/// HTTP 分类客户端
///
/// POST `{model, text}` 到配置的分类端点
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    fn build_payload(model: &InternalModel, text: &str) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("model".to_string(), json!(model.model.as_str()));
        payload.insert("text".to_string(), json!(text));
        payload
    }
}

#[async_trait]
impl Classify for HttpClassifier {
    async fn classify(&self, model: &InternalModel, text: &str) -> Result<Classification> {
        let payload = Self::build_payload(model, text);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProxyError::classifier_with_source("分类请求发送失败", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::classifier(format!(
                "分类服务返回非成功状态: {status}"
            )));
        }

        response
            .json::<Classification>()
            .await
            .map_err(|e| ProxyError::classifier_with_source("分类响应解析失败", e))
    }
}
