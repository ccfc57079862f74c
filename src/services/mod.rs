//! 业务逻辑服务层
//!
//! HTTP 处理器和 CLI 共用

mod bulk;
mod client_service;
mod installment_service;
mod lead_service;
mod loan_service;
mod noc_service;
mod payment_service;
pub mod schedule;
mod user_service;

use std::sync::Arc;

pub use bulk::*;
pub use client_service::*;
pub use installment_service::*;
pub use lead_service::*;
pub use loan_service::*;
pub use noc_service::*;
pub use payment_service::*;
pub use user_service::*;

use crate::storage::CrmStorage;

/// 基于同一存储句柄的全部服务
#[derive(Clone)]
pub struct Services {
    pub loans: Arc<LoanService>,
    pub installments: Arc<InstallmentService>,
    pub payments: Arc<PaymentService>,
    pub leads: Arc<LeadService>,
    pub clients: Arc<ClientService>,
    pub users: Arc<UserService>,
    pub nocs: Arc<NocService>,
}

impl Services {
    pub fn new(storage: Arc<CrmStorage>, policy: LoanPolicy) -> Self {
        let loans = Arc::new(LoanService::new(storage.clone(), policy));
        Self {
            installments: Arc::new(InstallmentService::new(storage.clone(), loans.clone())),
            payments: Arc::new(PaymentService::new(storage.clone())),
            leads: Arc::new(LeadService::new(storage.clone())),
            clients: Arc::new(ClientService::new(storage.clone())),
            users: Arc::new(UserService::new(storage.clone())),
            nocs: Arc::new(NocService::new(storage)),
            loans,
        }
    }
}
