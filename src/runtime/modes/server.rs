//! 服务器模式
//!
//! 将存储、服务和中间件装配到 actix HTTP 服务器

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    http::{Method, header},
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::middleware::{CrmAuth, RequestIdMiddleware};
use crate::api::services::crm::{crm_routes, json_config, query_config};
use crate::api::services::{AppStartTime, health_routes};
use crate::config::{CorsConfig, get_config};
use crate::runtime::lifetime;

/// CORS 配置不允许任何来源时发出警告（只执行一次）
fn validate_cors_config(cors_config: &CorsConfig) {
    if cors_config.enabled && cors_config.allowed_origins.is_empty() {
        warn!(
            "CORS enabled but allowed_origins is empty. \
            No cross-origin requests will be allowed. \
            Set allowed_origins explicitly or use '[\"*\"]' for any origin."
        );
    }
}

/// 根据 `[cors]` 构建 CORS 中间件
pub fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    // 禁用时由浏览器同源策略生效
    if !cors_config.enabled {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .expose_headers(vec![header::CONTENT_DISPOSITION])
        .max_age(cors_config.max_age as usize);

    if cors_config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// 运行 HTTP 服务器，直到停止或收到 Ctrl+C
///
/// 调用前必须先初始化日志系统
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {}", e))?;

    let config = get_config();
    let storage = startup.storage.clone();
    let services = web::Data::new(startup.services);
    let jwt = web::Data::new(startup.jwt);
    let api_prefix = config.api.prefix.clone();
    let payload_limit = config.api.payload_limit;
    let cors_config = config.cors.clone();
    validate_cors_config(&cors_config);

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let db_for_shutdown = storage.get_db().clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&cors_config))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(services.clone())
            .app_data(jwt.clone())
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(json_config(payload_limit))
            .app_data(query_config())
            .app_data(web::PayloadConfig::new(payload_limit))
            .service(health_routes())
            .service(crm_routes(&api_prefix).wrap(CrmAuth))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(&db_for_shutdown) => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
