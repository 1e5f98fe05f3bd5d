//! # 响应日志实体
//!
//! 上游响应完成（或流结束）后写入，一个请求至多一行

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 响应日志实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "response_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// 关联的请求ID
    pub request_id: String,

    /// 响应体（JSON 文本；流式响应为拼接后的原始文本）
    #[sea_orm(column_type = "Text")]
    pub response: String,
    /// 上游耗时（毫秒）
    pub latency_ms: i32,

    // === Token统计（上游报告时填写） ===
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,

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
