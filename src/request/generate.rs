//! # 生成请求解析
//!
//! 把入站请求体、认证头和路径参数解析成 `GenerateRequest`。
//! 除认证查询外不做任何网络IO

use crate::auth::{ApiKeyStore, AuthenticatedUser, extract_bearer_key};
use crate::error::{ProxyError, Result};
use crate::registry::{ModelRegistry, RegisteredModel};
use crate::types::{ApiUrl, MaxTokens, Message, ModelName, Temperature};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

/// 入站请求体的原始形态
#[derive(Debug, Deserialize)]
pub struct RawGenerateRequest {
    /// 逻辑模型名
    #[serde(rename = "model")]
    pub name: String,
    #[serde(default, rename = "stream")]
    pub is_streaming: bool,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f32>,
    pub messages: Vec<Value>,
}

/// 校验完成的生成请求，由处理它的任务独占
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub user: AuthenticatedUser,
    pub model: RegisteredModel,
    pub target_url: Url,
    pub is_streaming: bool,
    pub max_tokens: Option<MaxTokens>,
    pub temperature: Option<Temperature>,
    pub messages: Vec<Message>,
    pub client_ip: String,
}

impl RawGenerateRequest {
    /// 解析入站请求
    ///
    /// 认证失败返回 Auth 类错误，模型未注册返回 NotFound，
    /// 其余一律 Validation
    pub async fn parse(
        self,
        headers: &HeaderMap,
        path: &str,
        raw_query: Option<&str>,
        client_ip: String,
        registry: &ModelRegistry,
        key_store: &dyn ApiKeyStore,
    ) -> Result<GenerateRequest> {
        // Bearer 密钥与用户解析
        let api_key = extract_bearer_key(headers)?;
        let user = key_store.resolve(api_key).await?;

        // 逻辑名与注册表查询
        let name = ModelName::new(self.name)?;
        let model = registry
            .lookup(&name)
            .ok_or_else(|| ProxyError::not_found("model not found"))?;

        let target_url = join_target_url(&model.api_url, path, raw_query);

        // 消息数组
        if self.messages.is_empty() {
            return Err(ProxyError::validation(
                "messages must be a non-empty array",
            ));
        }
        let mut messages = Vec::with_capacity(self.messages.len());
        for raw in &self.messages {
            messages.push(Message::from_json(raw)?);
        }

        // 可选参数
        let max_tokens = self.max_tokens.map(MaxTokens::new).transpose()?;
        let temperature = self.temperature.map(Temperature::new).transpose()?;

        Ok(GenerateRequest {
            user,
            model,
            target_url,
            is_streaming: self.is_streaming,
            max_tokens,
            temperature,
            messages,
            client_ip,
        })
    }
}

impl GenerateRequest {
    /// 构造发往上游的请求体
    ///
    /// 逻辑名替换为上游模型标识；可选参数仅在设置时出现
    #[must_use]
    pub fn to_upstream_body(&self) -> Value {
        let mut body = json!({
            "model": self.model.model.as_str(),
            "messages": self.messages.iter().map(Message::to_json).collect::<Vec<_>>(),
            "stream": self.is_streaming,
        });

        let obj = body.as_object_mut().expect("body is an object");
        if let Some(max_tokens) = self.max_tokens {
            obj.insert("max_tokens".to_string(), json!(max_tokens.get()));
        }
        if let Some(temperature) = self.temperature {
            obj.insert("temperature".to_string(), json!(temperature.get()));
        }

        body
    }

    /// 审计行使用的参数对象（未设置的参数记为 null）
    #[must_use]
    pub fn audit_parameters(&self) -> Value {
        json!({
            "stream": self.is_streaming,
            "max_tokens": self.max_tokens.map(MaxTokens::get),
            "temperature": self.temperature.map(Temperature::get),
        })
    }

    /// 审计行使用的消息数组
    #[must_use]
    pub fn audit_messages(&self) -> Value {
        Value::Array(self.messages.iter().map(Message::to_json).collect())
    }
}

/// 拼接转发目标URL
///
/// 上游基础路径与入站路径按段拼接，保留入站原始查询串。
/// 上游路径为空时结果就是入站路径本身
#[must_use]
pub fn join_target_url(api_url: &ApiUrl, path: &str, raw_query: Option<&str>) -> Url {
    let mut url = api_url.as_url().clone();
    let base = url.path().trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    let joined = if suffix.is_empty() {
        if base.is_empty() { "/".to_string() } else { base.to_string() }
    } else {
        format!("{base}/{suffix}")
    };

    url.set_path(&joined);
    url.set_query(raw_query);
    url
}
