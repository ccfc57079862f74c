use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// 关闭任务允许的秒数
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 收到 Ctrl+C 并关闭连接池后返回
pub async fn listen_for_shutdown(db: &DatabaseConnection) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, closing connections...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    match timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(db),
    )
    .await
    {
        Ok(()) => info!("All shutdown tasks completed successfully"),
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds! Forcing exit.",
                SHUTDOWN_TIMEOUT_SECS
            );
            std::process::exit(1);
        }
    }
}

async fn perform_shutdown_tasks(db: &DatabaseConnection) {
    // 关闭任一句柄即关闭共享连接池
    if let Err(e) = db.clone().close().await {
        error!("Failed to close database connections: {}", e);
    } else {
        info!("Database connections closed");
    }
}
