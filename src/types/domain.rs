//! # 基础领域值类型

use crate::error::{ProxyError, Result};
use std::fmt;
use url::Url;

// ========================= ModelName =========================

/// 客户端使用的逻辑模型名
///
/// 1-64 个字符，仅允许字母、数字、`.`、`_`、`-`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelName(String);

impl ModelName {
    pub fn new<T: Into<String>>(value: T) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > 64 {
            return Err(ProxyError::validation(
                "name must be between 1 and 64 characters",
            ));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(ProxyError::validation(format!(
                "name '{value}' contains invalid characters"
            )));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================= ModelId =========================

/// 上游服务商要求的真实模型标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId(String);

impl ModelId {
    pub fn new<T: Into<String>>(value: T) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(ProxyError::validation("model cannot be empty"));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================= ApiUrl =========================

/// 上游服务的基础URL
///
/// 必须是绝对URL，scheme 为 http/https 且 host 非空
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrl(Url);

impl ApiUrl {
    pub fn new(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(ProxyError::validation("api_url cannot be empty"));
        }
        let parsed = Url::parse(value)
            .map_err(|_| ProxyError::validation(format!("api_url '{value}' is invalid")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProxyError::validation(format!(
                "api_url '{value}' must use http or https"
            )));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ProxyError::validation(format!(
                "api_url '{value}' is missing a host"
            )));
        }
        Ok(Self(parsed))
    }

    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

// ========================= ModelProvider =========================

/// 上游服务商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelProvider {
    OpenAi,
    Anthropic,
    Google,
    Meta,
    Custom,
}

impl ModelProvider {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "google" => Ok(Self::Google),
            "meta" => Ok(Self::Meta),
            "custom" => Ok(Self::Custom),
            other => Err(ProxyError::validation(format!(
                "invalid provider: {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Meta => "meta",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ========================= ModelStatus =========================

/// 注册模型的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelStatus {
    #[default]
    Active,
    Inactive,
}

impl ModelStatus {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(ProxyError::validation(format!("invalid status: {other}"))),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ========================= MaxTokens =========================

/// 生成上限 token 数，0 < v <= 32000
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxTokens(u32);

impl MaxTokens {
    pub fn new(value: i64) -> Result<Self> {
        if value <= 0 || value > 32_000 {
            return Err(ProxyError::validation(
                "invalid max_tokens value (must be > 0 and <= 32000)",
            ));
        }
        Ok(Self(value as u32))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

// ========================= Temperature =========================

/// 采样温度，0.0 <= v <= 2.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(f32);

impl Temperature {
    pub fn new(value: f32) -> Result<Self> {
        if !(0.0..=2.0).contains(&value) {
            return Err(ProxyError::validation(
                "invalid temperature value (must be between 0 and 2)",
            ));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_name_length_boundaries() {
        assert!(ModelName::new("a").is_ok());
        assert!(ModelName::new("a".repeat(64)).is_ok());
        assert!(ModelName::new("").is_err());
        assert!(ModelName::new("a".repeat(65)).is_err());
    }

    #[test]
    fn model_name_rejects_disallowed_chars() {
        assert!(ModelName::new("gpt-4.mini_v2").is_ok());
        assert!(ModelName::new("has space").is_err());
        assert!(ModelName::new("slash/name").is_err());
        assert!(ModelName::new("中文名").is_err());
    }

    #[test]
    fn api_url_requires_absolute_http() {
        assert!(ApiUrl::new("https://api.example/v1").is_ok());
        assert!(ApiUrl::new("http://localhost:8000").is_ok());
        assert!(ApiUrl::new("ftp://api.example").is_err());
        assert!(ApiUrl::new("/relative/path").is_err());
        assert!(ApiUrl::new("").is_err());
    }

    #[test]
    fn max_tokens_boundaries() {
        assert!(MaxTokens::new(1).is_ok());
        assert!(MaxTokens::new(32_000).is_ok());
        assert!(MaxTokens::new(0).is_err());
        assert!(MaxTokens::new(32_001).is_err());
    }

    #[test]
    fn temperature_boundaries() {
        assert!(Temperature::new(0.0).is_ok());
        assert!(Temperature::new(2.0).is_ok());
        assert!(Temperature::new(-0.01).is_err());
        assert!(Temperature::new(2.01).is_err());
    }

    #[test]
    fn provider_and_status_are_closed_sets() {
        for p in ["openai", "anthropic", "google", "meta", "custom"] {
            assert_eq!(ModelProvider::parse(p).unwrap().as_str(), p);
        }
        assert!(ModelProvider::parse("azure").is_err());
        assert_eq!(ModelStatus::parse("active").unwrap(), ModelStatus::Active);
        assert!(ModelStatus::parse("paused").is_err());
    }
}
