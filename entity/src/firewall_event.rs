//! # 防火墙事件实体
//!
//! 防火墙链每评估一个过滤器写入一行，按配置顺序插入

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 防火墙事件实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "firewall_event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// 关联的请求ID
    pub request_id: String,

    /// 防火墙实例ID（配置加载时生成的UUID）
    pub firewall_id: String,
    /// 防火墙类型（prompt-injection 等）
    pub firewall_type: String,
    /// 是否拦截
    pub blocked: bool,
    /// 拦截原因（命中的标签；未拦截为空串）
    pub blocked_reason: String,
    /// 风险分（命中标签的概率；未拦截为0）
    pub risk_score: f64,

    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::request_log::Entity",
        from = "Column::RequestId",
        to = "super::request_log::Column::RequestId",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    RequestLog,
}

impl Related<super::request_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
