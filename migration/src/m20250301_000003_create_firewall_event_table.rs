use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FirewallEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FirewallEvent::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FirewallEvent::RequestId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FirewallEvent::FirewallId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FirewallEvent::FirewallType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FirewallEvent::Blocked).boolean().not_null())
                    .col(
                        ColumnDef::new(FirewallEvent::BlockedReason)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(FirewallEvent::RiskScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(FirewallEvent::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_firewall_event_request_id")
                            .from(FirewallEvent::Table, FirewallEvent::RequestId)
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
                    .name("idx_firewall_event_request_id")
                    .table(FirewallEvent::Table)
                    .col(FirewallEvent::RequestId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FirewallEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FirewallEvent {
    Table,
    Id,
    RequestId,
    FirewallId,
    FirewallType,
    Blocked,
    BlockedReason,
    RiskScore,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RequestLog {
    Table,
    RequestId,
}
