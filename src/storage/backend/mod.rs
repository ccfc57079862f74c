//! SeaORM 存储后端
//!
//! 统一的 `CrmStorage` 句柄，支持 SQLite、MySQL/MariaDB 和 PostgreSQL
//! 每张表的读写放在各自的 `impl CrmStorage` 块中

mod clients;
mod connection;
mod converters;
mod installments;
mod leads;
mod loans;
mod nocs;
mod payments;
pub mod retry;
mod users;

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use moka::sync::Cache;
use sea_orm::{DatabaseConnection, DbErr};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::errors::{CrmError, Result};
use crate::storage::models::{
    ClientStatus, InstallmentStatus, LeadStatus, LoanStatus, PaymentMethod, UserRole, UserStatus,
};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::*;

pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
    {
        Ok("postgres".to_string())
    } else {
        Err(CrmError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

#[derive(Default, Clone, Debug)]
pub struct LoanFilter {
    pub status: Option<LoanStatus>,
    pub branch: Option<String>,
    /// 贷款 ID 或客户姓名的子串
    pub search: Option<String>,
    pub disbursed_from: Option<NaiveDate>,
    pub disbursed_to: Option<NaiveDate>,
    pub client_id: Option<i64>,
}

#[derive(Default, Clone, Debug)]
pub struct InstallmentFilter {
    pub loan_id: Option<String>,
    pub status: Option<InstallmentStatus>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}

#[derive(Default, Clone, Debug)]
pub struct PaymentFilter {
    pub loan_id: Option<String>,
    pub method: Option<PaymentMethod>,
    pub paid_from: Option<NaiveDate>,
    pub paid_to: Option<NaiveDate>,
}

#[derive(Default, Clone, Debug)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub branch: Option<String>,
    pub assigned_to: Option<String>,
    /// 姓名或手机号的子串
    pub search: Option<String>,
}

#[derive(Default, Clone, Debug)]
pub struct ClientFilter {
    pub status: Option<ClientStatus>,
    pub branch: Option<String>,
    pub search: Option<String>,
}

#[derive(Default, Clone, Debug)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// 插入前的还款记录
#[derive(Clone, Debug)]
pub struct NewPayment {
    pub loan_id: String,
    pub installment_id: i64,
    pub amount: rust_decimal::Decimal,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub remarks: Option<String>,
    pub utr: Option<String>,
    pub recorded_by: String,
}

#[derive(Clone)]
pub struct CrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 分页 COUNT 缓存（TTL 30 秒），每次写入时清空
    count_cache: Cache<String, u64>,
    retry_config: retry::RetryConfig,
}

impl CrmStorage {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        if config.database_url.is_empty() {
            return Err(CrmError::database_config("database_url is not set"));
        }
        let backend_name = infer_backend_from_url(&config.database_url)?;
        // sqlx 只识别 mysql 协议头
        let database_url = match config.database_url.strip_prefix("mariadb://") {
            Some(rest) => format!("mysql://{}", rest),
            None => config.database_url.clone(),
        };

        let db = if backend_name == "sqlite" {
            connect_sqlite(&database_url, config).await?
        } else {
            connect_generic(&database_url, &backend_name, config).await?
        };

        let storage = CrmStorage {
            db,
            backend_name,
            count_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(256)
                .build(),
            retry_config: retry::RetryConfig::from(config),
        };

        run_migrations(&storage.db).await?;

        warn!("{} storage initialized", storage.backend_name.to_uppercase());
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 访问一次数据库，用于就绪检查
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| CrmError::database_connection(e.to_string()))
    }

    pub fn invalidate_count_cache(&self) {
        self.count_cache.invalidate_all();
    }

    /// 经缓存的 COUNT(*)，临时错误时重试
    async fn cached_count<F, Fut>(&self, key: String, operation: F) -> Result<u64>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<u64, DbErr>>,
    {
        if let Some(cached) = self.count_cache.get(&key) {
            debug!("count cache hit: key={}, value={}", key, cached);
            return Ok(cached);
        }
        let count = retry::with_retry(&key, self.retry_config, operation).await?;
        self.count_cache.insert(key, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://crm.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("sqlite::memory:").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("data/crm.db").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mysql://root@localhost/crm").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("mariadb://root@localhost/crm").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgresql://localhost/crm").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }
}
