//! # Guard Proxy
//!
//! 启动顺序：日志 → 配置 → 三个清单 → 数据库（连接+迁移）→
//! 注册表/防火墙链 → 路由 → 监听。任一步失败进程以非零码退出

use guard_proxy::audit::AuditLogger;
use guard_proxy::auth::DerivedKeyStore;
use guard_proxy::classifier::HttpClassifier;
use guard_proxy::config::{InternalModels, ProviderCatalog};
use guard_proxy::firewall::{FirewallChain, FirewallConfig, RequestHook};
use guard_proxy::logging::{LogComponent, LogStage, SYSTEM};
use guard_proxy::registry::ModelRegistry;
use guard_proxy::server::AppState;
use guard_proxy::{lerror, linfo, proxy, server};
use std::sync::Arc;

#[tokio::main]
async fn main() -> guard_proxy::Result<()> {
    // 初始化日志
    guard_proxy::logging::init_logging();

    // 加载应用配置
    let config = match guard_proxy::config::load_config() {
        Ok(config) => config,
        Err(e) => {
            lerror!(
                SYSTEM,
                LogStage::Startup,
                LogComponent::Config,
                "load_config",
                format!("配置加载失败: {e}")
            );
            return Err(e);
        }
    };
    linfo!(
        SYSTEM,
        LogStage::Startup,
        LogComponent::Config,
        "load_config",
        format!(
            "配置加载成功, 服务器地址: {}:{}",
            config.server.host, config.server.port
        )
    );

    // 加载内部模型清单
    let internal_models = InternalModels::load(&config.manifests.internal_models)?;
    linfo!(
        SYSTEM,
        LogStage::Startup,
        LogComponent::Config,
        "load_models",
        format!("内部模型清单加载成功: {} 个模型", internal_models.all().len())
    );

    // 加载服务商目录
    let providers = ProviderCatalog::load(&config.manifests.providers)?;

    // 加载防火墙链配置
    let firewall_config = FirewallConfig::load(&config.manifests.firewall, &internal_models)?;
    linfo!(
        SYSTEM,
        LogStage::Startup,
        LogComponent::Firewall,
        "load_chain",
        format!(
            "防火墙链 '{}' 加载成功: {} 个过滤器",
            firewall_config.name,
            firewall_config.firewalls.len()
        )
    );

    // 初始化数据库并迁移
    let db = guard_proxy::database::init_database(&config.database.url)
        .await
        .map_err(|e| guard_proxy::ProxyError::database_with_source("数据库连接失败", e))?;
    guard_proxy::database::run_migrations(&db)
        .await
        .map_err(|e| guard_proxy::ProxyError::database_with_source("数据库迁移失败", e))?;

    // 装配共享依赖
    let audit = Arc::new(AuditLogger::new(db));
    let http_client = proxy::build_http_client()?;
    let classifier = Arc::new(HttpClassifier::new(
        http_client.clone(),
        config.classifier.endpoint.clone(),
    ));
    let hook: Option<Arc<dyn RequestHook>> = Some(Arc::new(FirewallChain::new(
        Arc::new(firewall_config),
        classifier,
        Arc::clone(&audit),
    )));

    let state = AppState {
        registry: Arc::new(ModelRegistry::new()),
        providers: Arc::new(providers),
        audit,
        http_client,
        key_store: Arc::new(DerivedKeyStore),
        hook,
    };

    // 启动服务
    server::run(state, &config.server.host, config.server.port).await
}
