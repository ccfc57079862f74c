//! 还款收款
//!
//! 还款记录只追加不修改，记录还款时在同一个数据库事务中
//! 结清对应分期

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::api::services::crm::TS_EXPORT_PATH;
use crate::errors::{CrmError, Result};
use crate::utils::money::check_money;
use crate::storage::{
    CrmStorage, Installment, InstallmentStatus, NewPayment, Payment, PaymentFilter, PaymentMethod,
};

const MAX_REMARKS_LEN: usize = 1000;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RecordPaymentRequest {
    pub loan_id: String,
    #[ts(type = "number")]
    pub installment_id: i64,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// 默认为今天
    pub payment_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub utr: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub installment: Installment,
    /// 分期金额减去实付金额（为正时）
    #[ts(type = "string | null")]
    pub shortfall: Option<Decimal>,
}

pub struct PaymentService {
    storage: Arc<CrmStorage>,
}

impl PaymentService {
    pub fn new(storage: Arc<CrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn record_payment(
        &self,
        req: RecordPaymentRequest,
        recorded_by: &str,
    ) -> Result<PaymentReceipt> {
        check_money(req.amount, "Payment amount")?;
        if req.amount <= Decimal::ZERO {
            return Err(CrmError::validation("Payment amount must be positive"));
        }
        let utr = req
            .utr
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        if req.method.requires_utr() && utr.is_none() {
            return Err(CrmError::validation(format!(
                "UTR is required for {} payments",
                req.method
            )));
        }
        let remarks = req
            .remarks
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if remarks.as_ref().is_some_and(|r| r.len() > MAX_REMARKS_LEN) {
            return Err(CrmError::validation("Remarks are too long"));
        }

        let loan = self
            .storage
            .get_loan(&req.loan_id)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("Loan {} not found", req.loan_id)))?;
        if !loan.status.accepts_payments() {
            return Err(CrmError::invalid_state(format!(
                "Loan {} is {} and does not accept payments",
                loan.loan_id, loan.status
            )));
        }

        let installment = self
            .storage
            .get_installment(req.installment_id)
            .await?
            .ok_or_else(|| {
                CrmError::not_found(format!("Installment {} not found", req.installment_id))
            })?;
        if installment.loan_id != loan.loan_id {
            return Err(CrmError::validation(format!(
                "Installment {} does not belong to loan {}",
                installment.installment_id, loan.loan_id
            )));
        }
        if installment.status == InstallmentStatus::Paid {
            return Err(CrmError::conflict(format!(
                "Installment #{} of loan {} is already paid",
                installment.installment_number, loan.loan_id
            )));
        }

        let shortfall = installment.amount - req.amount;
        if shortfall > Decimal::ZERO {
            warn!(
                "PaymentService: under-payment on loan {} installment #{}: paid {} of {}",
                loan.loan_id, installment.installment_number, req.amount, installment.amount
            );
        } else if shortfall < Decimal::ZERO {
            warn!(
                "PaymentService: over-payment on loan {} installment #{}: paid {} of {}",
                loan.loan_id, installment.installment_number, req.amount, installment.amount
            );
        }

        let new_payment = NewPayment {
            loan_id: loan.loan_id.clone(),
            installment_id: installment.installment_id,
            amount: req.amount,
            method: req.method,
            payment_date: req.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
            remarks,
            utr,
            recorded_by: recorded_by.to_string(),
        };

        let (payment, installment) = self.storage.record_payment(&new_payment).await?;
        info!(
            "PaymentService: {} {} received for loan {} by {}",
            payment.method, payment.amount, payment.loan_id, recorded_by
        );

        Ok(PaymentReceipt {
            payment,
            installment,
            shortfall: (shortfall > Decimal::ZERO).then_some(shortfall),
        })
    }

    pub async fn get_payment(&self, payment_id: i64) -> Result<Payment> {
        self.storage
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("Payment {} not found", payment_id)))
    }

    pub async fn list_payments(
        &self,
        filter: &PaymentFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Payment>, u64)> {
        self.storage
            .list_payments(filter, page.max(1), page_size.clamp(1, 100))
            .await
    }

    pub async fn list_for_loan(&self, loan_id: &str) -> Result<Vec<Payment>> {
        if !self.storage.loan_exists(loan_id).await? {
            return Err(CrmError::not_found(format!("Loan {} not found", loan_id)));
        }
        self.storage.list_payments_for_loan(loan_id).await
    }
}
