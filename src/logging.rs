//! # 统一日志工具模块
//!
//! 提供结构化业务日志宏和日志系统初始化：
//! 每条记录固定携带 request_id / stage / component / operation 字段

use std::env;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志阶段枚举
#[derive(Debug, Clone, Copy)]
pub enum LogStage {
    RequestStart,
    Authentication,
    Parse,
    Firewall,
    UpstreamRequest,
    Response,
    ResponseFailure,
    Audit,
    // 非请求上下文的阶段
    Startup,
    Shutdown,
    Configuration,
    Db,
    Internal,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestStart => "request_start",
            Self::Authentication => "authentication",
            Self::Parse => "parse",
            Self::Firewall => "firewall",
            Self::UpstreamRequest => "upstream_request",
            Self::Response => "response",
            Self::ResponseFailure => "response_failure",
            Self::Audit => "audit",
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Db => "db",
            Self::Internal => "internal",
        }
    }
}

/// 组件枚举
#[derive(Debug, Clone, Copy)]
pub enum LogComponent {
    // --- 系统组件 ---
    Main,
    ServerSetup,
    Config,
    Database,
    // --- 管道组件 ---
    Proxy,
    Parser,
    Auth,
    Registry,
    Firewall,
    Classifier,
    AuditSink,
    Upstream,
    Metrics,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ServerSetup => "server_setup",
            Self::Config => "config",
            Self::Database => "database",
            Self::Proxy => "proxy",
            Self::Parser => "parser",
            Self::Auth => "auth",
            Self::Registry => "registry",
            Self::Firewall => "firewall",
            Self::Classifier => "classifier",
            Self::AuditSink => "audit_sink",
            Self::Upstream => "upstream",
            Self::Metrics => "metrics",
        }
    }
}

/// 标准日志宏 - 信息级别
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr, $($rest:tt)*) => {
        tracing::info!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
            $($rest)*
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr) => {
        tracing::info!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
        )
    };
}

/// 标准日志宏 - 调试级别
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr, $($rest:tt)*) => {
        tracing::debug!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
            $($rest)*
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr) => {
        tracing::debug!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
        )
    };
}

/// 标准日志宏 - 警告级别
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr, $($rest:tt)*) => {
        tracing::warn!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
            $($rest)*
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr) => {
        tracing::warn!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
        )
    };
}

/// 标准日志宏 - 错误级别
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr, $($rest:tt)*) => {
        tracing::error!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
            $($rest)*
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr) => {
        tracing::error!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
        )
    };
}

/// 系统级日志使用的占位 request_id
pub const SYSTEM: &str = "system";

/// 初始化日志系统
///
/// `RUST_LOG` 优先；未设置时按 `LOG_MODE`（production/development/testing）
/// 选择默认过滤器
pub fn init_logging() {
    let default_filter = match env::var("LOG_MODE").ok().as_deref() {
        Some("development") => "debug,guard_proxy=debug,sea_orm=info,sqlx=warn",
        Some("testing") => "warn,guard_proxy=warn",
        _ => "info,guard_proxy=info,sea_orm=warn,sqlx=warn",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::try_new(default_filter).unwrap_or_default());

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(tracing_subscriber::filter::FilterFn::new(|metadata| {
            // 过滤掉一些噪音日志
            !metadata.target().starts_with("h2::")
                && !metadata.target().starts_with("hyper::")
                && !metadata.target().starts_with("hyper_util::")
                && !metadata.target().starts_with("tokio::runtime")
        }));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    linfo!(
        SYSTEM,
        LogStage::Startup,
        LogComponent::Main,
        "log_init",
        "日志系统已启动"
    );
}
