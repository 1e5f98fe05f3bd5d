//! # 请求日志实体
//!
//! 每个进入代理管道的请求写入一行，request_id 为主键，
//! 响应和防火墙事件行通过它关联

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 请求日志实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request_log")]
pub struct Model {
    /// 请求ID（UUID v4 文本形式）
    #[sea_orm(primary_key, auto_increment = false)]
    pub request_id: String,

    // === 调用方信息 ===
    pub user_id: String,
    pub api_key_id: String,

    // === 请求内容 ===
    /// 客户端使用的逻辑模型名
    pub model: String,
    /// 转发目标URL
    pub target_url: String,
    /// 消息数组（JSON 文本）
    #[sea_orm(column_type = "Text")]
    pub messages: String,
    /// 可选参数（JSON 文本：stream / max_tokens / temperature）
    #[sea_orm(column_type = "Text")]
    pub parameters: String,
    /// 客户端IP（不可解析时为空）
    pub client_ip: Option<String>,

    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::response_log::Entity")]
    ResponseLog,
    #[sea_orm(has_many = "super::firewall_event::Entity")]
    FirewallEvent,
}

impl Related<super::response_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResponseLog.def()
    }
}

impl Related<super::firewall_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FirewallEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
