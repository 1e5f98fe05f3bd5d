//! # 防火墙链求值
//!
//! 管道在解析与上游转发之间通过 `RequestHook` 调用这里。
//! 链按配置顺序迭代，每个过滤器求值后写一条事件行，
//! 首个拦截即短路返回

use super::config::FirewallConfig;
use crate::audit::{AuditLogger, NewFirewallEvent};
use crate::classifier::Classify;
use crate::error::{ProxyError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::request::GenerateRequest;
use crate::{ldebug, lwarn};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// 解析完成后、上游转发前的可插拔检查点
///
/// 不配置 hook 是合法的（纯代理模式），状态机不变
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// 放行返回 Ok；拦截返回 Blocked 错误；其余错误以500中止
    async fn on_request(&self, request_id: Uuid, request: &GenerateRequest) -> Result<()>;
}

/// 防火墙链：`RequestHook` 的标准实现
pub struct FirewallChain {
    config: Arc<FirewallConfig>,
    classifier: Arc<dyn Classify>,
    audit: Arc<AuditLogger>,
}

impl FirewallChain {
    #[must_use]
    pub fn new(
        config: Arc<FirewallConfig>,
        classifier: Arc<dyn Classify>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            config,
            classifier,
            audit,
        }
    }

    /// 事件行写失败只告警，不阻断用户路径
    async fn log_event(&self, event: NewFirewallEvent) {
        let request_id = event.request_id;
        let firewall_type = event.firewall_type.clone();
        if let Err(e) = self.audit.log_firewall_event(event).await {
            lwarn!(
                request_id,
                LogStage::Audit,
                LogComponent::AuditSink,
                "log_firewall_event",
                format!("防火墙事件写入失败 ({firewall_type}): {e}")
            );
        }
    }
}

#[async_trait]
impl RequestHook for FirewallChain {
    async fn on_request(&self, request_id: Uuid, request: &GenerateRequest) -> Result<()> {
        for firewall in &self.config.firewalls {
            let verdict = match firewall
                .apply(self.classifier.as_ref(), &request.messages)
                .await
            {
                Ok(verdict) => verdict,
                Err(e) => {
                    // 求值失败也尽量留下一条事件行，然后中止整条链
                    self.log_event(NewFirewallEvent {
                        request_id,
                        firewall_id: firewall.id,
                        firewall_type: firewall.firewall_type.as_str().to_string(),
                        blocked: false,
                        blocked_reason: String::new(),
                        risk_score: 0.0,
                    })
                    .await;
                    return Err(e);
                }
            };

            self.log_event(NewFirewallEvent {
                request_id,
                firewall_id: firewall.id,
                firewall_type: firewall.firewall_type.as_str().to_string(),
                blocked: !verdict.allowed,
                blocked_reason: verdict.reason.clone(),
                risk_score: verdict.risk_score,
            })
            .await;

            if !verdict.allowed {
                return Err(ProxyError::blocked(
                    "request rejected: blocked by firewall",
                ));
            }

            ldebug!(
                request_id,
                LogStage::Firewall,
                LogComponent::Firewall,
                "pass",
                format!("{} 放行", firewall.firewall_type)
            );
        }

        Ok(())
    }
}
