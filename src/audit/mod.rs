//! # 审计落库
//!
//! 请求、响应、防火墙事件三张表的追加写入与 trace 重建。
//! 写操作串行化在进程级互斥锁后面，保证共享连接突发下的写入顺序。
//! 因果约束：同一 request_id 的 log_request 先于其余两类写入完成，
//! 由管道在同一任务内顺序调用保证

use crate::error::{ProxyError, Result};
use chrono::Utc;
use entity::{firewall_event, request_log, response_log};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use std::net::IpAddr;
use tokio::sync::Mutex;
use uuid::Uuid;

/// 待写入的请求行
#[derive(Debug, Clone)]
pub struct NewRequestLog {
    pub user_id: Uuid,
    pub api_key_id: Uuid,
    /// 逻辑模型名
    pub model: String,
    pub target_url: String,
    /// 消息数组（JSON）
    pub messages: Value,
    /// 可选参数（JSON对象）
    pub parameters: Value,
    pub client_ip: String,
}

/// 待写入的响应行
#[derive(Debug, Clone)]
pub struct NewResponseLog {
    pub request_id: Uuid,
    /// 响应体文本（一次性响应为JSON，流式为拼接原文）
    pub response: String,
    pub latency_ms: i32,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

/// 待写入的防火墙事件行
#[derive(Debug, Clone)]
pub struct NewFirewallEvent {
    pub request_id: Uuid,
    pub firewall_id: Uuid,
    pub firewall_type: String,
    pub blocked: bool,
    pub blocked_reason: String,
    pub risk_score: f64,
}

/// 单个请求的完整追踪
#[derive(Debug, Clone)]
pub struct Trace {
    pub request_id: Uuid,
    pub user_id: String,
    pub model: String,
    pub messages: Vec<Value>,
    pub parameters: Value,
    pub response: String,
    pub client_ip: Option<String>,
    pub blocked: bool,
    pub blocked_reason: String,
    pub risk_score: f64,
    pub firewall_events: Vec<FirewallEventRecord>,
}

/// trace 内的一条防火墙事件
#[derive(Debug, Clone)]
pub struct FirewallEventRecord {
    pub firewall_id: String,
    pub firewall_type: String,
    pub blocked: bool,
    pub blocked_reason: String,
    pub risk_score: f64,
}

/// 审计写入器
#[derive(Debug)]
pub struct AuditLogger {
    db: DatabaseConnection,
    /// 串行化全部写操作
    write_lock: Mutex<()>,
}

impl AuditLogger {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// 写入请求行并返回生成的 request_id
    ///
    /// 失败向上传播，调用方以500中止请求
    pub async fn log_request(&self, entry: NewRequestLog) -> Result<Uuid> {
        let _guard = self.write_lock.lock().await;

        let request_id = Uuid::new_v4();
        // 不可解析的IP按空存储
        let client_ip = entry
            .client_ip
            .parse::<IpAddr>()
            .ok()
            .map(|ip| ip.to_string());

        let row = request_log::ActiveModel {
            request_id: Set(request_id.to_string()),
            user_id: Set(entry.user_id.to_string()),
            api_key_id: Set(entry.api_key_id.to_string()),
            model: Set(entry.model),
            target_url: Set(entry.target_url),
            messages: Set(entry.messages.to_string()),
            parameters: Set(entry.parameters.to_string()),
            client_ip: Set(client_ip),
            created_at: Set(Utc::now().naive_utc()),
        };
        row.insert(&self.db).await?;

        Ok(request_id)
    }

    /// 写入防火墙事件行
    ///
    /// 调用方对失败只记日志，不阻断用户路径
    pub async fn log_firewall_event(&self, entry: NewFirewallEvent) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let row = firewall_event::ActiveModel {
            request_id: Set(entry.request_id.to_string()),
            firewall_id: Set(entry.firewall_id.to_string()),
            firewall_type: Set(entry.firewall_type),
            blocked: Set(entry.blocked),
            blocked_reason: Set(entry.blocked_reason),
            risk_score: Set(entry.risk_score),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };
        row.insert(&self.db).await?;

        Ok(())
    }

    /// 写入响应行
    pub async fn log_response(&self, entry: NewResponseLog) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let row = response_log::ActiveModel {
            request_id: Set(entry.request_id.to_string()),
            response: Set(entry.response),
            latency_ms: Set(entry.latency_ms),
            input_tokens: Set(entry.input_tokens),
            output_tokens: Set(entry.output_tokens),
            total_tokens: Set(entry.total_tokens),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };
        row.insert(&self.db).await?;

        Ok(())
    }

    /// 重建一个请求的完整 trace
    pub async fn get_trace(&self, request_id: Uuid) -> Result<Trace> {
        let request = request_log::Entity::find_by_id(request_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| ProxyError::not_found("request not found"))?;

        let response = response_log::Entity::find()
            .filter(response_log::Column::RequestId.eq(request_id.to_string()))
            .one(&self.db)
            .await?;

        let events = firewall_event::Entity::find()
            .filter(firewall_event::Column::RequestId.eq(request_id.to_string()))
            .order_by_asc(firewall_event::Column::Id)
            .all(&self.db)
            .await?;

        let messages: Vec<Value> = serde_json::from_str(&request.messages)
            .map_err(|e| ProxyError::serialization("trace 消息字段损坏", e))?;
        // 参数字段损坏时按空对象处理
        let parameters: Value =
            serde_json::from_str(&request.parameters).unwrap_or(Value::Object(Default::default()));

        let firewall_events: Vec<FirewallEventRecord> = events
            .iter()
            .map(|e| FirewallEventRecord {
                firewall_id: e.firewall_id.clone(),
                firewall_type: e.firewall_type.clone(),
                blocked: e.blocked,
                blocked_reason: e.blocked_reason.clone(),
                risk_score: e.risk_score,
            })
            .collect();

        let blocking = firewall_events.iter().find(|e| e.blocked);

        Ok(Trace {
            request_id,
            user_id: request.user_id,
            model: request.model,
            messages,
            parameters,
            response: response.map(|r| r.response).unwrap_or_default(),
            client_ip: request.client_ip,
            blocked: blocking.is_some(),
            blocked_reason: blocking.map(|e| e.blocked_reason.clone()).unwrap_or_default(),
            risk_score: blocking.map_or(0.0, |e| e.risk_score),
            firewall_events,
        })
    }
}
