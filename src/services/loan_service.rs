//! 贷款管理服务
//!
//! 计算贷款的派生金额字段，保持还款计划与之同步，
//! 并维护状态机。HTTP 处理器和 CLI 共用

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use super::bulk::{BatchFailedItem, BatchResult, ImportMode, ImportResult};
use super::schedule::{RoundingPolicy, Schedule, ScheduleParams, generate_schedule};
use crate::api::services::crm::TS_EXPORT_PATH;
use crate::config::LoansConfig;
use crate::errors::{CrmError, Result};
use crate::storage::{CrmStorage, Loan, LoanFilter, LoanStats, LoanStatus};
use crate::utils::csv_handler::ParsedRow;
use crate::utils::generate_random_code;
use crate::utils::money::{check_money, check_percent, round_money};

const GENERATED_ID_PREFIX: &str = "LN";
const GENERATED_ID_LEN: usize = 8;
const MAX_LOAN_ID_LEN: usize = 64;

/// 来自 `[loans]` 的贷款规则
#[derive(Debug, Clone, PartialEq)]
pub struct LoanPolicy {
    pub default_installments: u32,
    pub interval_days: u32,
    pub rounding_dp: u32,
    pub rounding_policy: RoundingPolicy,
    pub gst_rate_percent: Decimal,
    pub strict_close: bool,
    pub allow_force_close: bool,
}

impl LoanPolicy {
    pub fn from_config(config: &LoansConfig) -> Self {
        Self {
            default_installments: config.default_installments,
            interval_days: config.installment_interval_days,
            rounding_dp: config.rounding_dp,
            rounding_policy: config.rounding_policy,
            gst_rate_percent: config.gst_rate_percent,
            strict_close: config.strict_close,
            allow_force_close: config.allow_force_close,
        }
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self::from_config(&LoansConfig::default())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateLoanRequest {
    /// 缺省时自动生成
    pub loan_id: Option<String>,
    #[ts(type = "number | null")]
    pub client_id: Option<i64>,
    pub customer_name: String,
    pub branch: String,
    pub sourced_by: Option<String>,
    #[ts(type = "string")]
    pub loan_amount: Decimal,
    #[serde(default)]
    #[ts(type = "string")]
    pub processing_fee: Decimal,
    /// 缺省时根据手续费计算
    #[ts(type = "string | null")]
    pub gst: Option<Decimal>,
    #[ts(type = "string | null")]
    pub roi: Option<Decimal>,
    #[ts(type = "string | null")]
    pub repayment_amount: Option<Decimal>,
    pub tenure_days: Option<i32>,
    pub date_of_disbursement: NaiveDate,
    pub total_installments: Option<u32>,
    #[serde(default = "default_generate_schedule")]
    pub generate_schedule: bool,
}

fn default_generate_schedule() -> bool {
    true
}

/// 部分更新，未提供的字段保持原值
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateLoanRequest {
    #[ts(type = "number | null")]
    pub client_id: Option<i64>,
    pub customer_name: Option<String>,
    pub branch: Option<String>,
    pub sourced_by: Option<String>,
    #[ts(type = "string | null")]
    pub loan_amount: Option<Decimal>,
    #[ts(type = "string | null")]
    pub processing_fee: Option<Decimal>,
    #[ts(type = "string | null")]
    pub gst: Option<Decimal>,
    #[ts(type = "string | null")]
    pub roi: Option<Decimal>,
    #[ts(type = "string | null")]
    pub repayment_amount: Option<Decimal>,
    pub tenure_days: Option<i32>,
    pub date_of_disbursement: Option<NaiveDate>,
    pub total_installments: Option<u32>,
}

impl UpdateLoanRequest {
    fn touches_schedule(&self, loan: &Loan) -> bool {
        let changed = |new: Option<Decimal>, old: Decimal| new.is_some_and(|v| v != old);
        changed(self.loan_amount, loan.loan_amount)
            || changed(self.processing_fee, loan.processing_fee)
            || changed(self.gst, loan.gst)
            || changed(self.roi, loan.roi)
            || changed(self.repayment_amount, loan.repayment_amount)
            || self
                .date_of_disbursement
                .is_some_and(|d| d != loan.date_of_disbursement)
            || self
                .total_installments
                .is_some_and(|n| i64::from(n) != i64::from(loan.total_installments))
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LoanCreateResult {
    pub loan: Loan,
    pub installments_created: usize,
    pub generated_id: bool,
}

/// 派生字段计算的输入
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermsInput {
    pub loan_amount: Decimal,
    pub processing_fee: Decimal,
    pub gst: Option<Decimal>,
    pub roi: Option<Decimal>,
    pub repayment_amount: Option<Decimal>,
    pub total_installments: Option<u32>,
    pub tenure_days: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    pub processing_fee: Decimal,
    pub gst: Decimal,
    pub net_disbursement: Decimal,
    pub repayment_amount: Decimal,
    pub interest_earned: Decimal,
    pub roi: Decimal,
    pub total_installments: u32,
    pub tenure_days: i32,
}

/// 计算 GST、净放款额、应还总额、利息和期限
///
/// 同时给出应还总额和 ROI 时以应还总额为准，
/// 并据此重新计算 ROI
pub fn derive_terms(input: &TermsInput, policy: &LoanPolicy) -> Result<LoanTerms> {
    let loan_amount = check_money(input.loan_amount, "loan_amount")?;
    let processing_fee = check_money(input.processing_fee, "processing_fee")?;
    if loan_amount <= Decimal::ZERO {
        return Err(CrmError::validation("Loan amount must be positive"));
    }
    if processing_fee < Decimal::ZERO {
        return Err(CrmError::validation("Processing fee cannot be negative"));
    }

    let gst = match input.gst {
        Some(gst) => check_money(gst, "gst")?,
        None => round_money(in_range(
            processing_fee
                .checked_mul(policy.gst_rate_percent)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED)),
        )?),
    };
    if gst < Decimal::ZERO {
        return Err(CrmError::validation("GST cannot be negative"));
    }

    let net_disbursement = in_range(
        loan_amount
            .checked_sub(processing_fee)
            .and_then(|v| v.checked_sub(gst)),
    )?;
    if net_disbursement <= Decimal::ZERO {
        return Err(CrmError::validation(format!(
            "Net disbursement must be positive (loan {} - fee {} - gst {})",
            loan_amount, processing_fee, gst
        )));
    }

    let (repayment_amount, roi) = match (input.repayment_amount, input.roi) {
        (Some(repayment), _) => {
            let repayment = check_money(repayment, "repayment_amount")?;
            let roi = in_range(
                repayment
                    .checked_sub(loan_amount)
                    .and_then(|v| v.checked_div(loan_amount))
                    .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED)),
            )?;
            (repayment, round_money(roi))
        }
        (None, Some(roi)) => {
            let roi = check_percent(roi, "roi")?;
            if roi < Decimal::ZERO {
                return Err(CrmError::validation("ROI cannot be negative"));
            }
            let repayment = in_range(
                roi.checked_div(Decimal::ONE_HUNDRED)
                    .and_then(|v| v.checked_add(Decimal::ONE))
                    .and_then(|v| v.checked_mul(loan_amount)),
            )?;
            (check_money(round_money(repayment), "repayment_amount")?, roi)
        }
        (None, None) => {
            return Err(CrmError::validation(
                "Either roi or repayment_amount is required",
            ));
        }
    };
    if repayment_amount < loan_amount {
        return Err(CrmError::validation(format!(
            "Repayment amount {} is below the loan amount {}",
            repayment_amount, loan_amount
        )));
    }
    // 以基点存储
    let roi = check_percent(roi, "roi")?;

    let total_installments = input.total_installments.unwrap_or(policy.default_installments);
    if total_installments == 0 {
        return Err(CrmError::validation("total_installments must be at least 1"));
    }

    let tenure_days = match input.tenure_days {
        Some(days) if days <= 0 => {
            return Err(CrmError::validation("tenure_days must be positive"));
        }
        Some(days) => days,
        None => tenure_for(total_installments, policy.interval_days)?,
    };

    Ok(LoanTerms {
        processing_fee,
        gst,
        net_disbursement,
        repayment_amount,
        interest_earned: repayment_amount - loan_amount,
        roi,
        total_installments,
        tenure_days,
    })
}

/// `count` 期、每期间隔 `interval_days` 天覆盖的总天数
pub fn tenure_for(count: u32, interval_days: u32) -> Result<i32> {
    i32::try_from(u64::from(count) * u64::from(interval_days))
        .map_err(|_| CrmError::validation("Tenure out of range"))
}

fn in_range(value: Option<Decimal>) -> Result<Decimal> {
    value.ok_or_else(|| CrmError::validation("Amount out of range"))
}

/// `[A-Za-z0-9_-]{1,64}`
pub fn is_valid_loan_id(loan_id: &str) -> bool {
    !loan_id.is_empty()
        && loan_id.len() <= MAX_LOAN_ID_LEN
        && loan_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn required_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CrmError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct LoanService {
    storage: Arc<CrmStorage>,
    policy: LoanPolicy,
}

impl LoanService {
    pub fn new(storage: Arc<CrmStorage>, policy: LoanPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// 按配置的舍入方式生成 `total` 的还款计划，偏差写入日志
    pub fn build_schedule(
        &self,
        loan_id: &str,
        total: Decimal,
        disbursement_date: NaiveDate,
        count: u32,
    ) -> Result<Schedule> {
        let schedule = generate_schedule(&ScheduleParams {
            total,
            disbursement_date,
            count,
            interval_days: self.policy.interval_days,
            rounding_dp: self.policy.rounding_dp,
            policy: self.policy.rounding_policy,
        })?;

        let drift = schedule.rounding_drift();
        if !drift.is_zero() {
            warn!(
                "Schedule for loan {} drifts {} from repayment {} ({} x {})",
                loan_id, drift, total, count, schedule.installment_amount
            );
        }
        Ok(schedule)
    }

    async fn generate_loan_id(&self) -> Result<String> {
        for _ in 0..5 {
            let candidate = format!(
                "{}{}",
                GENERATED_ID_PREFIX,
                generate_random_code(GENERATED_ID_LEN)
            );
            if !self.storage.loan_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(CrmError::conflict("Could not generate a unique loan id"))
    }

    async fn check_client(&self, client_id: Option<i64>) -> Result<()> {
        if let Some(id) = client_id
            && self.storage.get_client(id).await?.is_none()
        {
            return Err(CrmError::validation(format!("Client {} does not exist", id)));
        }
        Ok(())
    }

    /// 校验请求并组装贷款记录及其还款计划
    fn build_loan(
        &self,
        loan_id: String,
        req: &CreateLoanRequest,
    ) -> Result<(Loan, Option<Schedule>)> {
        let customer_name = required_text(&req.customer_name, "customer_name")?;
        let branch = required_text(&req.branch, "branch")?;

        let terms = derive_terms(
            &TermsInput {
                loan_amount: req.loan_amount,
                processing_fee: req.processing_fee,
                gst: req.gst,
                roi: req.roi,
                repayment_amount: req.repayment_amount,
                total_installments: req.total_installments,
                tenure_days: req.tenure_days,
            },
            &self.policy,
        )?;

        let schedule = self.build_schedule(
            &loan_id,
            terms.repayment_amount,
            req.date_of_disbursement,
            terms.total_installments,
        )?;

        let now = Utc::now();
        let loan = Loan {
            loan_id,
            client_id: req.client_id,
            customer_name,
            branch,
            sourced_by: optional_text(req.sourced_by.clone()),
            loan_amount: req.loan_amount,
            processing_fee: terms.processing_fee,
            gst: terms.gst,
            net_disbursement: terms.net_disbursement,
            repayment_amount: terms.repayment_amount,
            interest_earned: terms.interest_earned,
            roi: terms.roi,
            tenure_days: terms.tenure_days,
            date_of_disbursement: req.date_of_disbursement,
            installment_amount: schedule.installment_amount,
            total_installments: i32::try_from(terms.total_installments)
                .map_err(|_| CrmError::validation("total_installments out of range"))?,
            status: LoanStatus::Active,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };

        Ok((loan, req.generate_schedule.then_some(schedule)))
    }

    pub async fn create_loan(&self, req: CreateLoanRequest) -> Result<LoanCreateResult> {
        let (loan_id, generated_id) = match optional_text(req.loan_id.clone()) {
            Some(id) => {
                if !is_valid_loan_id(&id) {
                    return Err(CrmError::validation(format!(
                        "Invalid loan id '{}'. Use 1-64 letters, digits, '_' or '-'.",
                        id
                    )));
                }
                if self.storage.loan_exists(&id).await? {
                    return Err(CrmError::conflict(format!("Loan {} already exists", id)));
                }
                (id, false)
            }
            None => (self.generate_loan_id().await?, true),
        };

        self.check_client(req.client_id).await?;
        let (loan, schedule) = self.build_loan(loan_id, &req)?;

        let installments = schedule.map(|s| s.installments).unwrap_or_default();
        self.storage
            .insert_loan_with_schedule(&loan, &installments)
            .await?;

        info!(
            "LoanService: created loan {} for {} ({} disbursed, {} repayable)",
            loan.loan_id, loan.customer_name, loan.net_disbursement, loan.repayment_amount
        );
        Ok(LoanCreateResult {
            loan,
            installments_created: installments.len(),
            generated_id,
        })
    }

    pub async fn get_loan(&self, loan_id: &str) -> Result<Loan> {
        self.storage
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("Loan {} not found", loan_id)))
    }

    pub async fn list_loans(
        &self,
        filter: &LoanFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Loan>, u64)> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        self.storage.list_loans(filter, page, page_size).await
    }

    /// 编辑贷款。金额、期数或日期变化会重新生成还款计划，
    /// 已有分期还款后拒绝此类修改
    pub async fn edit_loan(&self, loan_id: &str, req: UpdateLoanRequest) -> Result<Loan> {
        let existing = self.get_loan(loan_id).await?;
        let touches_schedule = req.touches_schedule(&existing);

        if touches_schedule {
            let paid = self.storage.count_paid_installments(loan_id).await?;
            if paid > 0 {
                return Err(CrmError::invalid_state(format!(
                    "Loan {} has {} paid installments; amounts, count and date can no longer change",
                    loan_id, paid
                )));
            }
        }
        if let Some(client_id) = req.client_id
            && existing.client_id != Some(client_id)
        {
            self.check_client(Some(client_id)).await?;
        }

        let loan_amount = req.loan_amount.unwrap_or(existing.loan_amount);
        let processing_fee = req.processing_fee.unwrap_or(existing.processing_fee);
        let gst = match req.gst {
            Some(gst) => Some(gst),
            None if req.processing_fee.is_some_and(|f| f != existing.processing_fee) => None,
            None => Some(existing.gst),
        };
        let (roi, repayment_amount) = match (req.repayment_amount, req.roi) {
            (Some(repayment), _) => (None, Some(repayment)),
            (None, Some(roi)) => (Some(roi), None),
            (None, None) if loan_amount != existing.loan_amount => (Some(existing.roi), None),
            (None, None) => (None, Some(existing.repayment_amount)),
        };
        let total_installments = req.total_installments.or_else(|| {
            u32::try_from(existing.total_installments).ok()
        });
        let tenure_days = match (req.tenure_days, req.total_installments) {
            (Some(days), _) => Some(days),
            (None, Some(_)) => None,
            (None, None) => Some(existing.tenure_days),
        };

        let terms = derive_terms(
            &TermsInput {
                loan_amount,
                processing_fee,
                gst,
                roi,
                repayment_amount,
                total_installments,
                tenure_days,
            },
            &self.policy,
        )?;

        let date_of_disbursement = req
            .date_of_disbursement
            .unwrap_or(existing.date_of_disbursement);

        let mut loan = existing.clone();
        if let Some(ref name) = req.customer_name {
            loan.customer_name = required_text(name, "customer_name")?;
        }
        if let Some(ref branch) = req.branch {
            loan.branch = required_text(branch, "branch")?;
        }
        if req.sourced_by.is_some() {
            loan.sourced_by = optional_text(req.sourced_by.clone());
        }
        if req.client_id.is_some() {
            loan.client_id = req.client_id;
        }
        loan.loan_amount = loan_amount;
        loan.processing_fee = terms.processing_fee;
        loan.gst = terms.gst;
        loan.net_disbursement = terms.net_disbursement;
        loan.repayment_amount = terms.repayment_amount;
        loan.interest_earned = terms.interest_earned;
        loan.roi = terms.roi;
        loan.tenure_days = terms.tenure_days;
        loan.date_of_disbursement = date_of_disbursement;
        loan.total_installments = i32::try_from(terms.total_installments)
            .map_err(|_| CrmError::validation("total_installments out of range"))?;
        loan.updated_at = Utc::now();

        if touches_schedule {
            let schedule = self.build_schedule(
                loan_id,
                terms.repayment_amount,
                date_of_disbursement,
                terms.total_installments,
            )?;
            loan.installment_amount = schedule.installment_amount;
            self.storage
                .update_loan(&loan, Some(&schedule.installments))
                .await?;
            info!(
                "LoanService: edited loan {} and regenerated {} installments",
                loan_id,
                schedule.installments.len()
            );
        } else {
            self.storage.update_loan(&loan, None).await?;
            info!("LoanService: edited loan {}", loan_id);
        }

        Ok(loan)
    }

    /// 按状态机变更贷款状态
    ///
    /// `strict_close` 开启时，结清仍有未还分期的贷款需要 `force`，
    /// 并且 `allow_force_close` 必须允许
    pub async fn update_status(
        &self,
        loan_id: &str,
        status: LoanStatus,
        force: bool,
    ) -> Result<Loan> {
        let loan = self.get_loan(loan_id).await?;

        if loan.status == status {
            return Err(CrmError::invalid_state(format!(
                "Loan {} is already {}",
                loan_id, status
            )));
        }
        if !loan.status.can_transition_to(status) {
            return Err(CrmError::invalid_state(format!(
                "Loan {} cannot move from {} to {}",
                loan_id, loan.status, status
            )));
        }

        if status == LoanStatus::Closed && self.policy.strict_close {
            let outstanding = self.storage.count_outstanding_installments(loan_id).await?;
            if outstanding > 0 {
                if !(force && self.policy.allow_force_close) {
                    return Err(CrmError::invalid_state(format!(
                        "Loan {} has {} unpaid installments",
                        loan_id, outstanding
                    )));
                }
                warn!(
                    "LoanService: force-closing loan {} with {} unpaid installments",
                    loan_id, outstanding
                );
            }
        }

        let closed_at = status.is_terminal().then(Utc::now);
        self.storage
            .set_loan_status(loan_id, status, closed_at)
            .await?;
        info!(
            "LoanService: loan {} {} -> {}",
            loan_id, loan.status, status
        );

        self.get_loan(loan_id).await
    }

    /// 逐个结清贷款，单个失败不影响整批
    pub async fn bulk_close(&self, loan_ids: &[String], force: bool) -> BatchResult {
        let mut result = BatchResult {
            success: Vec::new(),
            failed: Vec::new(),
        };

        for loan_id in loan_ids {
            match self.update_status(loan_id, LoanStatus::Closed, force).await {
                Ok(_) => result.success.push(loan_id.clone()),
                Err(e) => result.failed.push(BatchFailedItem {
                    key: loan_id.clone(),
                    reason: e.message().to_string(),
                }),
            }
        }

        info!(
            "LoanService: bulk close finished, {} closed, {} failed",
            result.success.len(),
            result.failed.len()
        );
        result
    }

    pub async fn stats(&self) -> Result<LoanStats> {
        self.storage.loan_stats().await
    }

    pub async fn export_loans(&self, filter: &LoanFilter) -> Result<Vec<Loan>> {
        self.storage.list_all_loans(filter).await
    }

    /// 导入已解析的 CSV 行，每行独立成功或失败
    pub async fn import_loans(
        &self,
        rows: Vec<ParsedRow<CreateLoanRequest>>,
        mode: ImportMode,
    ) -> ImportResult {
        let mut result = ImportResult {
            total_rows: rows.len(),
            ..ImportResult::default()
        };

        for parsed in rows {
            let req = match parsed.item {
                Ok(req) => req,
                Err(e) => {
                    result.fail(parsed.row, parsed.key, e.message());
                    continue;
                }
            };

            match self.import_one(req, mode).await {
                Ok(true) => result.success_count += 1,
                Ok(false) => result.skipped_count += 1,
                Err(e) => result.fail(parsed.row, parsed.key, e.message()),
            }
        }

        info!(
            "LoanService: import finished, {} rows, {} imported, {} skipped, {} failed",
            result.total_rows, result.success_count, result.skipped_count, result.failed_count
        );
        result
    }

    /// `Ok(false)` 表示已跳过
    async fn import_one(&self, req: CreateLoanRequest, mode: ImportMode) -> Result<bool> {
        let existing = match optional_text(req.loan_id.clone()) {
            Some(id) => self.storage.get_loan(&id).await?,
            None => None,
        };

        let Some(existing) = existing else {
            self.create_loan(req).await?;
            return Ok(true);
        };

        match mode {
            ImportMode::Skip => Ok(false),
            ImportMode::Error => Err(CrmError::conflict(format!(
                "Loan {} already exists",
                existing.loan_id
            ))),
            ImportMode::Overwrite => {
                let paid = self
                    .storage
                    .count_paid_installments(&existing.loan_id)
                    .await?;
                if paid > 0 {
                    return Err(CrmError::invalid_state(format!(
                        "Loan {} has paid installments and cannot be overwritten",
                        existing.loan_id
                    )));
                }
                self.check_client(req.client_id).await?;

                let (mut loan, schedule) = self.build_loan(existing.loan_id.clone(), &req)?;
                loan.created_at = existing.created_at;
                loan.status = existing.status;
                loan.closed_at = existing.closed_at;

                let installments = schedule.map(|s| s.installments).unwrap_or_default();
                self.storage.update_loan(&loan, Some(&installments)).await?;
                info!("LoanService: overwrote loan {} from import", loan.loan_id);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(loan_amount: Decimal) -> TermsInput {
        TermsInput {
            loan_amount,
            processing_fee: Decimal::ZERO,
            gst: None,
            roi: None,
            repayment_amount: None,
            total_installments: None,
            tenure_days: None,
        }
    }

    #[test]
    fn test_terms_from_roi() {
        let terms = derive_terms(
            &TermsInput {
                processing_fee: dec!(500),
                roi: Some(dec!(20)),
                ..input(dec!(10000))
            },
            &LoanPolicy::default(),
        )
        .unwrap();
        assert_eq!(terms.gst, dec!(90.00));
        assert_eq!(terms.net_disbursement, dec!(9410.00));
        assert_eq!(terms.repayment_amount, dec!(12000.00));
        assert_eq!(terms.interest_earned, dec!(2000.00));
        assert_eq!(terms.total_installments, 14);
        assert_eq!(terms.tenure_days, 98);
    }

    #[test]
    fn test_terms_from_repayment() {
        let terms = derive_terms(
            &TermsInput {
                repayment_amount: Some(dec!(12500)),
                ..input(dec!(10000))
            },
            &LoanPolicy::default(),
        )
        .unwrap();
        assert_eq!(terms.roi, dec!(25.00));
        assert_eq!(terms.interest_earned, dec!(2500));
    }

    #[test]
    fn test_explicit_gst_and_tenure_are_kept() {
        let terms = derive_terms(
            &TermsInput {
                processing_fee: dec!(500),
                gst: Some(dec!(0)),
                roi: Some(dec!(10)),
                total_installments: Some(10),
                tenure_days: Some(75),
                ..input(dec!(5000))
            },
            &LoanPolicy::default(),
        )
        .unwrap();
        assert_eq!(terms.gst, dec!(0));
        assert_eq!(terms.net_disbursement, dec!(4500));
        assert_eq!(terms.total_installments, 10);
        assert_eq!(terms.tenure_days, 75);
    }

    #[test]
    fn test_terms_validation() {
        let policy = LoanPolicy::default();
        assert!(derive_terms(&input(dec!(1000)), &policy).is_err());
        assert!(derive_terms(&TermsInput { roi: Some(dec!(10)), ..input(dec!(0)) }, &policy).is_err());
        assert!(
            derive_terms(
                &TermsInput {
                    repayment_amount: Some(dec!(900)),
                    ..input(dec!(1000))
                },
                &policy
            )
            .is_err()
        );
        assert!(
            derive_terms(
                &TermsInput {
                    processing_fee: dec!(1000),
                    roi: Some(dec!(10)),
                    ..input(dec!(1000))
                },
                &policy
            )
            .is_err()
        );
        assert!(
            derive_terms(
                &TermsInput {
                    roi: Some(dec!(10)),
                    total_installments: Some(0),
                    ..input(dec!(1000))
                },
                &policy
            )
            .is_err()
        );
    }

    #[test]
    fn test_terms_reject_out_of_range_amounts() {
        let policy = LoanPolicy::default();
        let huge_repayment = derive_terms(
            &TermsInput {
                repayment_amount: Some(Decimal::MAX),
                ..input(dec!(1))
            },
            &policy,
        );
        assert!(matches!(huge_repayment, Err(CrmError::Validation(_))));

        let huge_roi = derive_terms(
            &TermsInput {
                roi: Some(Decimal::MAX),
                ..input(dec!(1000))
            },
            &policy,
        );
        assert!(matches!(huge_roi, Err(CrmError::Validation(_))));

        // ROI 未超上限，但应还总额超过金额上限
        let huge_product = derive_terms(
            &TermsInput {
                roi: Some(dec!(99999)),
                ..input(dec!(100000000000))
            },
            &policy,
        );
        assert!(matches!(huge_product, Err(CrmError::Validation(_))));

        // 应还总额在范围内，推算出的 ROI 超限
        let huge_implied_roi = derive_terms(
            &TermsInput {
                repayment_amount: Some(dec!(100000000)),
                ..input(dec!(1))
            },
            &policy,
        );
        assert!(matches!(huge_implied_roi, Err(CrmError::Validation(_))));

        assert!(derive_terms(&TermsInput { roi: Some(dec!(10)), ..input(Decimal::MAX) }, &policy).is_err());
    }

    #[test]
    fn test_terms_reject_sub_paise_amounts() {
        let policy = LoanPolicy::default();
        let with = |f: fn(&mut TermsInput)| {
            let mut i = TermsInput {
                roi: Some(dec!(20)),
                ..input(dec!(10000))
            };
            f(&mut i);
            derive_terms(&i, &policy)
        };
        assert!(with(|_| {}).is_ok());
        assert!(with(|i| i.loan_amount = dec!(1000.005)).is_err());
        assert!(with(|i| i.processing_fee = dec!(10.001)).is_err());
        assert!(with(|i| i.gst = Some(dec!(1.999))).is_err());
        assert!(with(|i| i.roi = Some(dec!(20.125))).is_err());
        assert!(
            with(|i| {
                i.roi = None;
                i.repayment_amount = Some(dec!(12000.001));
            })
            .is_err()
        );
        // 末尾的零不算额外精度
        assert!(with(|i| i.loan_amount = dec!(10000.000)).is_ok());
    }

    #[test]
    fn test_loan_id_format() {
        assert!(is_valid_loan_id("LN-2024_001"));
        assert!(is_valid_loan_id("A"));
        assert!(!is_valid_loan_id(""));
        assert!(!is_valid_loan_id("LN 001"));
        assert!(!is_valid_loan_id("LN/001"));
        assert!(!is_valid_loan_id(&"A".repeat(65)));
    }

    #[test]
    fn test_policy_from_config() {
        let config = LoansConfig {
            strict_close: false,
            ..LoansConfig::default()
        };
        let policy = LoanPolicy::from_config(&config);
        assert!(!policy.strict_close);
        assert_eq!(policy.default_installments, 14);
        assert_eq!(policy.interval_days, 7);
    }
}
