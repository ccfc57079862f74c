//! 共用测试夹具：每个测试使用独立的临时 SQLite 数据库

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use loan_crm::config::DatabaseConfig;
use loan_crm::services::{
    CreateLeadRequest, CreateLoanRequest, CreateUserRequest, LoanPolicy, Services,
};
use loan_crm::storage::{CrmStorage, User, UserRole};

pub const TEST_PASSWORD: &str = "s3cret-pass";

/// 临时目录的生命周期与存储相同
pub struct TestEnv {
    _dir: TempDir,
    pub storage: Arc<CrmStorage>,
    pub services: Services,
}

pub async fn test_env() -> TestEnv {
    test_env_with_policy(LoanPolicy::default()).await
}

pub async fn test_env_with_policy(policy: LoanPolicy) -> TestEnv {
    let dir = TempDir::new().expect("create temp dir");
    let db_path = dir.path().join("crm_test.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        pool_size: 2,
        ..DatabaseConfig::default()
    };
    let storage = Arc::new(CrmStorage::new(&config).await.expect("open storage"));
    let services = Services::new(storage.clone(), policy);
    TestEnv {
        _dir: dir,
        storage,
        services,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// 本金 10,000，利率 20%，14 期周还款，手续费 500
pub fn loan_request(loan_id: &str) -> CreateLoanRequest {
    CreateLoanRequest {
        loan_id: Some(loan_id.to_string()),
        client_id: None,
        customer_name: "Ravi Kumar".to_string(),
        branch: "Pune".to_string(),
        sourced_by: Some("Meena".to_string()),
        loan_amount: Decimal::from(10_000),
        processing_fee: Decimal::from(500),
        gst: None,
        roi: Some(Decimal::from(20)),
        repayment_amount: None,
        tenure_days: None,
        date_of_disbursement: date(2024, 1, 1),
        total_installments: None,
        generate_schedule: true,
    }
}

pub fn lead_request(name: &str, phone: &str) -> CreateLeadRequest {
    CreateLeadRequest {
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        requested_amount: Some(Decimal::from(25_000)),
        branch: Some("Nashik".to_string()),
        source: Some("Walk-in".to_string()),
        assigned_to: None,
        notes: None,
        status: None,
    }
}

pub async fn create_user(services: &Services, email: &str, role: UserRole) -> User {
    services
        .users
        .create_user(CreateUserRequest {
            name: format!("{} user", role),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            role,
        })
        .await
        .expect("create user")
}
