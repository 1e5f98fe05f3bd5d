//! # 防火墙相关的闭集类型

use crate::error::{ProxyError, Result};
use std::fmt;

/// 防火墙类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FirewallType {
    PromptInjection,
    MaliciousIntent,
    Custom,
    PolicyViolation,
    SensitiveData,
    HallucinationRisk,
    Spam,
    Obfuscation,
}

impl FirewallType {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "prompt-injection" => Ok(Self::PromptInjection),
            "malicious-intent" => Ok(Self::MaliciousIntent),
            "custom" => Ok(Self::Custom),
            "policy-violation" => Ok(Self::PolicyViolation),
            "sensitive-data" => Ok(Self::SensitiveData),
            "hallucination-risk" => Ok(Self::HallucinationRisk),
            "spam" => Ok(Self::Spam),
            "obfuscation" => Ok(Self::Obfuscation),
            other => Err(ProxyError::validation(format!(
                "invalid firewall type: {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PromptInjection => "prompt-injection",
            Self::MaliciousIntent => "malicious-intent",
            Self::Custom => "custom",
            Self::PolicyViolation => "policy-violation",
            Self::SensitiveData => "sensitive-data",
            Self::HallucinationRisk => "hallucination-risk",
            Self::Spam => "spam",
            Self::Obfuscation => "obfuscation",
        }
    }
}

impl fmt::Display for FirewallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 内部分类模型的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalModelType {
    TextClassification,
    ImageClassification,
}

impl InternalModelType {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "text-classification" => Ok(Self::TextClassification),
            "image-classification" => Ok(Self::ImageClassification),
            other => Err(ProxyError::validation(format!(
                "invalid internal model type: {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TextClassification => "text-classification",
            Self::ImageClassification => "image-classification",
        }
    }
}

impl fmt::Display for InternalModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
