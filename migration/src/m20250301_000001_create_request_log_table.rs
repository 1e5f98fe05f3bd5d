use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RequestLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RequestLog::RequestId)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    // === 调用方信息 ===
                    .col(
                        ColumnDef::new(RequestLog::UserId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RequestLog::ApiKeyId)
                            .string_len(36)
                            .not_null(),
                    )
                    // === 请求内容 ===
                    .col(ColumnDef::new(RequestLog::Model).string_len(64).not_null())
                    .col(
                        ColumnDef::new(RequestLog::TargetUrl)
                            .string_len(1000)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RequestLog::Messages).text().not_null())
                    .col(ColumnDef::new(RequestLog::Parameters).text().not_null())
                    .col(ColumnDef::new(RequestLog::ClientIp).string_len(45))
                    .col(
                        ColumnDef::new(RequestLog::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_request_log_created_at")
                    .table(RequestLog::Table)
                    .col(RequestLog::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RequestLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RequestLog {
    Table,
    RequestId,
    UserId,
    ApiKeyId,
    Model,
    TargetUrl,
    Messages,
    Parameters,
    ClientIp,
    CreatedAt,
}
