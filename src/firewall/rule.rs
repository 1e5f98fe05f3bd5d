//! # 单个防火墙的求值
//!
//! 八种类型共享同一套标签-阈值策略：调用分类服务，
//! 任一非安全标签概率超过阈值即拦截

use crate::classifier::Classify;
use crate::config::InternalModel;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::types::{FirewallType, Message};
use crate::{ldebug, linfo};
use uuid::Uuid;

/// 视为安全、跳过阈值判断的标签（小写比较）
const SAFE_LABELS: [&str; 3] = ["safe", "neutral", "benign"];

/// 一个已配置的防火墙
#[derive(Debug, Clone)]
pub struct Firewall {
    pub enabled: bool,
    pub id: Uuid,
    pub firewall_type: FirewallType,
    pub model: InternalModel,
    pub blocking_threshold: f64,
}

/// 求值结果
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub allowed: bool,
    /// 拦截时为命中的标签，放行为空串
    pub reason: String,
    /// 拦截时为命中标签的概率
    pub risk_score: f64,
}

impl Verdict {
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
            risk_score: 0.0,
        }
    }

    #[must_use]
    pub fn deny(reason: String, risk_score: f64) -> Self {
        Self {
            allowed: false,
            reason,
            risk_score,
        }
    }
}

impl Firewall {
    /// 对消息序列求值，只看最新一条
    pub async fn apply(&self, classifier: &dyn Classify, messages: &[Message]) -> Result<Verdict> {
        if !self.enabled {
            return Ok(Verdict::allow());
        }
        let Some(message) = messages.last() else {
            return Ok(Verdict::allow());
        };

        linfo!(
            self.id,
            LogStage::Firewall,
            LogComponent::Firewall,
            "apply",
            format!("运行 {} 防火墙", self.firewall_type)
        );

        let classification = classifier.classify(&self.model, message.content()).await?;

        for (label, probability) in classification.pairs() {
            if SAFE_LABELS.contains(&label.to_lowercase().as_str()) {
                ldebug!(
                    self.id,
                    LogStage::Firewall,
                    LogComponent::Firewall,
                    "skip_safe_label",
                    format!("跳过安全标签: {label}")
                );
                continue;
            }
            if probability > self.blocking_threshold {
                linfo!(
                    self.id,
                    LogStage::Firewall,
                    LogComponent::Firewall,
                    "deny",
                    format!(
                        "标签 {label} 置信度 {probability} 超过阈值 {}",
                        self.blocking_threshold
                    )
                );
                return Ok(Verdict::deny(label.to_string(), probability));
            }
        }

        Ok(Verdict::allow())
    }
}
