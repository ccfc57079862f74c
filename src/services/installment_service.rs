//! 分期查询、手动修改、还款计划（重新）生成与逾期扫描

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use ts_rs::TS;

use super::loan_service::{LoanService, tenure_for};
use crate::api::services::crm::TS_EXPORT_PATH;
use crate::errors::{CrmError, Result};
use crate::utils::money::check_money;
use crate::storage::{CrmStorage, Installment, InstallmentFilter, InstallmentStatus};

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateInstallmentRequest {
    pub due_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub amount: Option<Decimal>,
    pub status: Option<InstallmentStatus>,
    /// 手动标记为 Paid 时使用，默认为今天
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct GenerateInstallmentsRequest {
    pub loan_id: String,
    /// 替换现有的未还款计划
    #[serde(default)]
    pub replace: bool,
    /// 默认为贷款的期数
    pub total_installments: Option<u32>,
}

pub struct InstallmentService {
    storage: Arc<CrmStorage>,
    loans: Arc<LoanService>,
}

impl InstallmentService {
    pub fn new(storage: Arc<CrmStorage>, loans: Arc<LoanService>) -> Self {
        Self { storage, loans }
    }

    pub async fn list_installments(
        &self,
        filter: &InstallmentFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Installment>, u64)> {
        self.storage
            .list_installments(filter, page.max(1), page_size.clamp(1, 100))
            .await
    }

    pub async fn list_for_loan(&self, loan_id: &str) -> Result<Vec<Installment>> {
        if !self.storage.loan_exists(loan_id).await? {
            return Err(CrmError::not_found(format!("Loan {} not found", loan_id)));
        }
        self.storage.list_installments_for_loan(loan_id).await
    }

    pub async fn get_installment(&self, installment_id: i64) -> Result<Installment> {
        self.storage
            .get_installment(installment_id)
            .await?
            .ok_or_else(|| {
                CrmError::not_found(format!("Installment {} not found", installment_id))
            })
    }

    /// 手动修正。已还分期的金额、到期日和状态保持不变
    pub async fn update_installment(
        &self,
        installment_id: i64,
        req: UpdateInstallmentRequest,
    ) -> Result<Installment> {
        let mut item = self.get_installment(installment_id).await?;

        if item.status == InstallmentStatus::Paid {
            let amount_changed = req.amount.is_some_and(|a| a != item.amount);
            let due_changed = req.due_date.is_some_and(|d| d != item.due_date);
            let status_changed = req.status.is_some_and(|s| s != InstallmentStatus::Paid);
            if amount_changed || due_changed || status_changed {
                return Err(CrmError::invalid_state(format!(
                    "Installment {} is paid and cannot be changed",
                    installment_id
                )));
            }
        }

        if let Some(amount) = req.amount {
            check_money(amount, "Installment amount")?;
            if amount <= Decimal::ZERO {
                return Err(CrmError::validation("Installment amount must be positive"));
            }
            item.amount = amount;
        }
        if let Some(due_date) = req.due_date {
            item.due_date = due_date;
        }
        if let Some(status) = req.status {
            if status == InstallmentStatus::Paid && item.status != InstallmentStatus::Paid {
                item.paid_date = Some(req.paid_date.unwrap_or_else(|| Utc::now().date_naive()));
            } else if status != InstallmentStatus::Paid {
                item.paid_date = None;
            }
            item.status = status;
        }
        item.updated_at = Utc::now();

        let item = self.storage.update_installment(&item).await?;
        info!(
            "InstallmentService: updated installment {} of loan {} ({})",
            item.installment_id, item.loan_id, item.status
        );
        Ok(item)
    }

    /// 根据应还总额（重新）生成贷款的还款计划
    ///
    /// 贷款已有还款时拒绝；已有计划时只有 `replace = true`
    /// 才会替换
    pub async fn generate(&self, req: GenerateInstallmentsRequest) -> Result<Vec<Installment>> {
        let mut loan = self.loans.get_loan(&req.loan_id).await?;
        if loan.status.is_terminal() {
            return Err(CrmError::invalid_state(format!(
                "Loan {} is {}",
                loan.loan_id, loan.status
            )));
        }
        if self.storage.count_paid_installments(&loan.loan_id).await? > 0
            || self.storage.count_payments_for_loan(&loan.loan_id).await? > 0
        {
            return Err(CrmError::invalid_state(format!(
                "Loan {} already has payments; its schedule cannot be regenerated",
                loan.loan_id
            )));
        }

        let existing = self.storage.list_installments_for_loan(&loan.loan_id).await?;
        if !existing.is_empty() && !req.replace {
            return Err(CrmError::conflict(format!(
                "Loan {} already has {} installments; pass replace=true to regenerate",
                loan.loan_id,
                existing.len()
            )));
        }

        let count = match req.total_installments {
            Some(n) => n,
            None => u32::try_from(loan.total_installments)
                .map_err(|_| CrmError::validation("Loan has an invalid installment count"))?,
        };
        let schedule = self.loans.build_schedule(
            &loan.loan_id,
            loan.repayment_amount,
            loan.date_of_disbursement,
            count,
        )?;

        loan.installment_amount = schedule.installment_amount;
        let previous_count = loan.total_installments;
        loan.total_installments = i32::try_from(count)
            .map_err(|_| CrmError::validation("total_installments out of range"))?;
        if loan.total_installments != previous_count {
            loan.tenure_days = tenure_for(count, self.loans.policy().interval_days)?;
        }
        loan.updated_at = Utc::now();
        self.storage
            .update_loan(&loan, Some(&schedule.installments))
            .await?;

        info!(
            "InstallmentService: generated {} installments for loan {} (replaced {})",
            schedule.installments.len(),
            loan.loan_id,
            existing.len()
        );
        self.storage.list_installments_for_loan(&loan.loan_id).await
    }

    /// 到期日早于 `today` 的 Pending 分期标记为 Overdue
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<u64> {
        self.storage.mark_overdue(today).await
    }

    /// 每隔 `interval` 执行一次逾期扫描，首次立即执行
    pub fn spawn_overdue_sweep(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let today = Utc::now().date_naive();
                match service.mark_overdue(today).await {
                    Ok(0) => debug!("Overdue sweep: nothing to mark"),
                    Ok(n) => info!("Overdue sweep: {} installments marked overdue", n),
                    Err(e) => error!("Overdue sweep failed: {}", e),
                }
            }
        })
    }
}
