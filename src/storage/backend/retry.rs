//! 数据库临时错误的指数退避重试

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 判断错误是否可重试（死锁、锁等待、SQLite 忙、连接池耗尽）
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => {
            is_retryable_runtime_error(runtime_err)
        }
        _ => false,
    }
}

fn is_retryable_runtime_error(err: &sea_orm::error::RuntimeErr) -> bool {
    use sea_orm::error::RuntimeErr;

    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(db_err) = sqlx_err.deref().as_database_error()
                && let Some(code) = db_err.code()
            {
                return is_retryable_code(code.as_ref());
            }
            is_retryable_message(&sqlx_err.to_string().to_lowercase())
        }
        RuntimeErr::Internal(msg) => is_retryable_message(&msg.to_lowercase()),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

/// 通过错误码识别：MySQL 1213/1205、PostgreSQL 40001/40P01、SQLite BUSY/LOCKED
fn is_retryable_code(code: &str) -> bool {
    matches!(code, "1213" | "1205" | "40001" | "40P01" | "5" | "6")
}

fn is_retryable_message(msg: &str) -> bool {
    ["deadlock", "lock wait timeout", "database is locked", "serialization failure"]
        .iter()
        .any(|needle| msg.contains(needle))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl From<&DatabaseConfig> for RetryConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// 执行 `operation`，可重试错误最多重试 `config.max_retries` 次
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt < config.max_retries && is_retryable_error(&e) => {
                attempt += 1;
                let delay = calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {} ms",
                    operation_name,
                    attempt,
                    config.max_retries + 1,
                    e,
                    delay
                );
                sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 计算指数退避延迟：`base * 2^(attempt-1)`，不超过 `max`，另加 0-25% 随机抖动
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    use rand::RngExt;
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp_delay.min(max_ms);
    let jitter = rand::rng().random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}
