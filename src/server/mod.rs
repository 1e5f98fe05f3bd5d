//! # 服务器装配
//!
//! 路由注册与共享依赖注入。依赖在构造路由时显式注入，
//! 请求作用域内只携带 request_id 与取消信号

mod handlers;

use crate::audit::AuditLogger;
use crate::auth::ApiKeyStore;
use crate::config::ProviderCatalog;
use crate::error::Result;
use crate::firewall::RequestHook;
use crate::logging::{LogComponent, LogStage, SYSTEM};
use crate::registry::ModelRegistry;
use crate::{linfo, proxy};
use axum::Router;
use axum::routing::{any, get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// 全部处理器共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub providers: Arc<ProviderCatalog>,
    pub audit: Arc<AuditLogger>,
    pub http_client: reqwest::Client,
    pub key_store: Arc<dyn ApiKeyStore>,
    /// 解析与转发之间的检查点；`None` 为纯代理模式
    pub hook: Option<Arc<dyn RequestHook>>,
}

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // 管理端点
        .route("/model/register", post(handlers::register_model))
        .route("/model/list", get(handlers::list_models))
        .route("/model/list/providers", get(handlers::list_providers))
        .route("/health", get(handlers::health))
        // 代理端点，捕获 /v1 下全部路径
        .route("/v1/{*path}", any(proxy::generate_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// 绑定端口并运行，收到 ctrl-c 后优雅退出
pub async fn run(state: AppState, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| crate::error::ProxyError::server_start_with_source("监听地址无效", e))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| crate::error::ProxyError::server_start_with_source("端口绑定失败", e))?;

    linfo!(
        SYSTEM,
        LogStage::Startup,
        LogComponent::ServerSetup,
        "listen",
        format!("代理服务监听 {addr}")
    );

    axum::serve(
        listener,
        create_routes(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| crate::error::ProxyError::server_start_with_source("服务器运行失败", e))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    linfo!(
        SYSTEM,
        LogStage::Shutdown,
        LogComponent::ServerSetup,
        "shutdown",
        "收到退出信号，开始优雅关闭"
    );
}
