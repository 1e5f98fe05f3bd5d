use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ResponseLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResponseLog::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ResponseLog::RequestId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ResponseLog::Response).text().not_null())
                    .col(ColumnDef::new(ResponseLog::LatencyMs).integer().not_null())
                    // === Token统计 ===
                    .col(ColumnDef::new(ResponseLog::InputTokens).integer())
                    .col(ColumnDef::new(ResponseLog::OutputTokens).integer())
                    .col(ColumnDef::new(ResponseLog::TotalTokens).integer())
                    .col(
                        ColumnDef::new(ResponseLog::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_response_log_request_id")
                            .from(ResponseLog::Table, ResponseLog::RequestId)
                            .to(RequestLog::Table, RequestLog::RequestId)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_response_log_request_id")
                    .table(ResponseLog::Table)
                    .col(ResponseLog::RequestId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResponseLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ResponseLog {
    Table,
    Id,
    RequestId,
    Response,
    LatencyMs,
    InputTokens,
    OutputTokens,
    TotalTokens,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RequestLog {
    Table,
    RequestId,
}
