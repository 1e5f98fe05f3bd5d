//! # 错误类型定义

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum ProxyError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 请求字段校验错误
    #[error("{message}")]
    Validation { message: String },

    /// 认证错误（缺失/无效的 Bearer 密钥）
    #[error("{message}")]
    Auth { message: String },

    /// 资源不存在
    #[error("{message}")]
    NotFound { message: String },

    /// 防火墙拦截
    #[error("{message}")]
    Blocked { message: String },

    /// 上游服务不可达
    #[error("{message}")]
    UpstreamUnavailable {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 分类推理服务错误
    #[error("分类服务错误: {message}")]
    Classifier {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 服务器启动错误
    #[error("服务器启动错误: {message}")]
    ServerStart {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ProxyError {
    /// 映射为 HTTP 状态码
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Auth { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Blocked { .. } => StatusCode::FORBIDDEN,
            Self::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::Config { .. }
            | Self::Database { .. }
            | Self::Classifier { .. }
            | Self::Serialization { .. }
            | Self::Io { .. }
            | Self::ServerStart { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否属于可直接透出给客户端的错误
    ///
    /// 运维类错误（数据库、序列化等）对外只暴露笼统消息
    #[must_use]
    pub const fn is_client_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Auth { .. }
                | Self::NotFound { .. }
                | Self::Blocked { .. }
                | Self::UpstreamUnavailable { .. }
        )
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建校验错误
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// 创建认证错误
    pub fn auth<T: Into<String>>(message: T) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// 创建防火墙拦截错误
    pub fn blocked<T: Into<String>>(message: T) -> Self {
        Self::Blocked {
            message: message.into(),
        }
    }

    /// 创建上游不可达错误
    pub fn upstream_unavailable<T: Into<String>>(message: T) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的上游不可达错误
    pub fn upstream_unavailable_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建分类服务错误
    pub fn classifier<T: Into<String>>(message: T) -> Self {
        Self::Classifier {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的分类服务错误
    pub fn classifier_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Classifier {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建序列化错误
    pub fn serialization<T: Into<String>, E: Into<anyhow::Error>>(message: T, source: E) -> Self {
        Self::Serialization {
            message: message.into(),
            source: source.into(),
        }
    }

    /// 创建服务器启动错误
    pub fn server_start<T: Into<String>>(message: T) -> Self {
        Self::ServerStart {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的服务器启动错误
    pub fn server_start_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerStart {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<sea_orm::DbErr> for ProxyError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_client_facing() {
            self.to_string()
        } else {
            "internal server error".to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
