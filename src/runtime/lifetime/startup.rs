use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::jwt::JwtService;
use crate::config::get_config;
use crate::services::{LoanPolicy, Services};
use crate::storage::CrmStorage;

pub struct StartupContext {
    pub storage: Arc<CrmStorage>,
    pub services: Services,
    pub jwt: JwtService,
}

/// 打开数据库并执行待处理的迁移
pub async fn open_storage() -> Result<Arc<CrmStorage>> {
    let config = get_config();
    let storage = CrmStorage::new(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());
    Ok(Arc::new(storage))
}

/// 存储与服务集合，服务器模式和 CLI 模式共用
pub async fn build_services() -> Result<(Arc<CrmStorage>, Services)> {
    let storage = open_storage().await?;
    let policy = LoanPolicy::from_config(&get_config().loans);
    debug!("Loan policy: {:?}", policy);
    let services = Services::new(storage.clone(), policy);
    Ok((storage, services))
}

/// HTTP 服务器绑定端口前所需的全部依赖
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let (storage, services) = build_services().await?;
    let config = get_config();

    services
        .users
        .bootstrap_admin(&config.auth)
        .await
        .context("Failed to bootstrap admin user")?;

    let sweep_secs = config.installments.overdue_sweep_interval_secs;
    if sweep_secs > 0 {
        services
            .installments
            .spawn_overdue_sweep(Duration::from_secs(sweep_secs));
        info!("Overdue sweep scheduled every {}s", sweep_secs);
    } else {
        info!("Overdue sweep disabled");
    }

    let jwt = JwtService::from_config(&config.auth);

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        services,
        jwt,
    })
}
