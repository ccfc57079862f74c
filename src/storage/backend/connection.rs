use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{CrmError, Result};
use migration::{Migrator, MigratorTrait};

/// SQLite：启用 WAL 和 busy timeout，文件不存在时自动创建
pub async fn connect_sqlite(database_url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
    };
    use std::str::FromStr;

    let opt = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| CrmError::database_config(format!("Invalid SQLite URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .pragma("temp_store", "memory");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.pool_size.max(1))
        .acquire_timeout(Duration::from_secs(config.timeout))
        .connect_with(opt)
        .await
        .map_err(|e| CrmError::database_connection(format!("Cannot open SQLite database: {}", e)))?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// MySQL / PostgreSQL
pub async fn connect_generic(
    database_url: &str,
    backend_name: &str,
    config: &DatabaseConfig,
) -> Result<DatabaseConnection> {
    let timeout = Duration::from_secs(config.timeout);

    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(config.pool_size)
        .min_connections(config.pool_size.min(2))
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        CrmError::database_connection(format!(
            "Cannot connect to {} database: {}",
            backend_name.to_uppercase(),
            e
        ))
    })
}

pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| CrmError::database_operation(format!("Migration failed: {}", e)))?;

    info!("Database migrations completed");
    Ok(())
}
