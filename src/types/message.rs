//! # 聊天消息类型

use crate::error::{ProxyError, Result};
use serde_json::{Value, json};
use std::fmt;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(ProxyError::validation(format!("role '{other}' is invalid"))),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一条校验过的聊天消息：角色合法、内容非空
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    role: MessageRole,
    content: String,
}

impl Message {
    pub fn new<T: Into<String>>(role: MessageRole, content: T) -> Result<Self> {
        let content = content.into();
        if content.is_empty() {
            return Err(ProxyError::validation("message content cannot be empty"));
        }
        Ok(Self { role, content })
    }

    /// 从请求体中的一个 JSON 对象构造
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ProxyError::validation("invalid message format"))?;
        let role = obj
            .get("role")
            .and_then(Value::as_str)
            .ok_or_else(|| ProxyError::validation("message is missing a role"))?;
        let content = obj
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| ProxyError::validation("message is missing content"))?;
        Self::new(MessageRole::parse(role)?, content)
    }

    #[must_use]
    pub const fn role(&self) -> MessageRole {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// 转为上游请求体使用的 `{role, content}` 对象
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "role": self.role.as_str(),
            "content": self.content,
        })
    }
}
