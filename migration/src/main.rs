use sea_orm_migration::prelude::*;
use std::env;

#[tokio::main]
async fn main() {
    // 未设置 DATABASE_URL 时默认使用 data/guard.db
    if env::var("DATABASE_URL").is_err() {
        let db_path = if env::current_dir().unwrap().ends_with("migration") {
            "../data/guard.db"
        } else {
            "data/guard.db"
        };
        env::set_var("DATABASE_URL", format!("sqlite://{}?mode=rwc", db_path));
    }
    cli::run_cli(migration::Migrator).await;
}
