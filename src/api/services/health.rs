use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};
use ts_rs::TS;

use crate::api::services::crm::{ApiResponse, ErrorCode, TS_EXPORT_PATH};
use crate::storage::CrmStorage;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    pub error: Option<String>,
}

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// 启动以来的秒数
    #[ts(type = "number")]
    pub uptime: u64,
    pub version: String,
    pub storage: HealthStorageCheck,
    #[ts(type = "number")]
    pub response_time_ms: u64,
}

/// 存活检查、就绪检查与完整健康报告
///
/// 直接访问存储层，健康检查不依赖业务逻辑
pub struct HealthService;

impl HealthService {
    async fn check_storage(storage: &CrmStorage) -> HealthStorageCheck {
        let backend = storage.backend_name().to_string();
        match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, storage.ping()).await {
            Ok(Ok(())) => HealthStorageCheck {
                status: "healthy".to_string(),
                backend,
                error: None,
            },
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    error: Some(e.message().to_string()),
                }
            }
            Err(_) => {
                error!("Storage health check timeout");
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        }
    }

    pub async fn health_check(
        storage: web::Data<Arc<CrmStorage>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let storage_status = Self::check_storage(&storage).await;
        let is_healthy = storage_status.status == "healthy";
        let now = chrono::Utc::now();

        let health_data = HealthResponse {
            status: storage_status.status.clone(),
            timestamp: now.to_rfc3339(),
            uptime: (now - app_start_time.start_datetime).num_seconds().max(0) as u64,
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: storage_status,
            response_time_ms: start_time.elapsed().as_millis() as u64,
        };

        let (status, code, message) = if is_healthy {
            (actix_web::http::StatusCode::OK, ErrorCode::Success, "OK")
        } else {
            (
                actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ServiceUnavailable,
                "Service Unavailable",
            )
        };

        info!(
            "Health check completed in {:?}, status: {}",
            start_time.elapsed(),
            health_data.status
        );

        HttpResponse::build(status)
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(ApiResponse {
                code: code as i32,
                message: message.to_string(),
                data: Some(health_data),
            })
    }

    /// 数据库可响应即视为就绪
    pub async fn readiness_check(storage: web::Data<Arc<CrmStorage>>) -> impl Responder {
        trace!("Received readiness check request");
        match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, storage.ping()).await {
            Ok(Ok(())) => HttpResponse::Ok()
                .append_header(("Content-Type", "text/plain"))
                .body("OK"),
            _ => HttpResponse::ServiceUnavailable()
                .append_header(("Content-Type", "text/plain"))
                .body("Database unavailable"),
        }
    }

    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");
        HttpResponse::NoContent().finish()
    }
}

/// `/health`、`/health/ready`、`/health/live`，无需认证
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
