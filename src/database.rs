//! # 数据库模块
//!
//! 数据库连接和迁移管理

use crate::logging::{LogComponent, LogStage, SYSTEM};
use crate::{ldebug, linfo};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, DbErr};
use std::path::Path;

/// 初始化数据库连接
pub async fn init_database(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    linfo!(
        SYSTEM,
        LogStage::Db,
        LogComponent::Database,
        "connect",
        format!("正在连接数据库: {database_url}")
    );

    // SQLite 需要保证数据库文件的父目录存在
    if let Some(db_path) = database_url
        .strip_prefix("sqlite://")
        .filter(|p| !p.starts_with(':'))
    {
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        if let Some(parent_dir) = Path::new(db_path).parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                ldebug!(
                    SYSTEM,
                    LogStage::Db,
                    LogComponent::Database,
                    "mkdir",
                    format!("创建数据库目录: {}", parent_dir.display())
                );
                std::fs::create_dir_all(parent_dir).map_err(|e| {
                    DbErr::Custom(format!("无法创建数据库目录 {}: {e}", parent_dir.display()))
                })?;
            }
        }
    }

    let db = Database::connect(database_url).await?;
    db.ping().await?;

    linfo!(
        SYSTEM,
        LogStage::Db,
        LogComponent::Database,
        "connected",
        "数据库连接成功"
    );

    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    migration::Migrator::up(db, None).await?;
    linfo!(
        SYSTEM,
        LogStage::Db,
        LogComponent::Database,
        "migrate",
        "数据库迁移完成"
    );
    Ok(())
}
