//! 领域记录及其状态枚举
//!
//! 金额在此使用 `Decimal`，写入数据库时由后端转换为最小货币单位

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use ts_rs::TS;

use crate::api::services::crm::TS_EXPORT_PATH;
use crate::utils::money::format_inr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[strum(ascii_case_insensitive)]
pub enum LoanStatus {
    Active,
    Closed,
    Foreclosed,
    Default,
}

impl LoanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Closed | LoanStatus::Foreclosed)
    }

    /// 贷款未结清时才接受还款
    pub fn accepts_payments(self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Default)
    }

    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, next),
            (Active, Closed)
                | (Active, Foreclosed)
                | (Active, Default)
                | (Default, Active)
                | (Default, Closed)
                | (Default, Foreclosed)
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[strum(ascii_case_insensitive)]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
    Default,
    Bounced,
}

impl InstallmentStatus {
    /// 借款人仍需偿还
    pub fn is_outstanding(self) -> bool {
        matches!(
            self,
            InstallmentStatus::Pending | InstallmentStatus::Overdue | InstallmentStatus::Bounced
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[strum(ascii_case_insensitive)]
pub enum PaymentMethod {
    Cash,
    Upi,
    Neft,
    Imps,
    Rtgs,
    Cheque,
    Other,
}

impl PaymentMethod {
    /// 电子转账需要银行流水号
    pub fn requires_utr(self) -> bool {
        matches!(
            self,
            PaymentMethod::Upi | PaymentMethod::Neft | PaymentMethod::Imps | PaymentMethod::Rtgs
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[strum(ascii_case_insensitive)]
pub enum LeadStatus {
    Open,
    InProcess,
    Converted,
    Rejected,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[strum(ascii_case_insensitive)]
pub enum ClientStatus {
    Active,
    Inactive,
}

/// 按权限排序：`Employee < Manager < Admin`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[strum(ascii_case_insensitive)]
pub enum UserRole {
    Employee,
    Manager,
    Admin,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[strum(ascii_case_insensitive)]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Loan {
    pub loan_id: String,
    #[ts(type = "number | null")]
    pub client_id: Option<i64>,
    pub customer_name: String,
    pub branch: String,
    pub sourced_by: Option<String>,
    #[ts(type = "string")]
    pub loan_amount: Decimal,
    #[ts(type = "string")]
    pub processing_fee: Decimal,
    #[ts(type = "string")]
    pub gst: Decimal,
    #[ts(type = "string")]
    pub net_disbursement: Decimal,
    #[ts(type = "string")]
    pub repayment_amount: Decimal,
    #[ts(type = "string")]
    pub interest_earned: Decimal,
    /// 百分比，例如 `20.00`
    #[ts(type = "string")]
    pub roi: Decimal,
    pub tenure_days: i32,
    pub date_of_disbursement: NaiveDate,
    #[ts(type = "string")]
    pub installment_amount: Decimal,
    pub total_installments: i32,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Installment {
    #[ts(type = "number")]
    pub installment_id: i64,
    pub loan_id: String,
    pub installment_number: i32,
    pub due_date: NaiveDate,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub status: InstallmentStatus,
    pub paid_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Payment {
    #[ts(type = "number")]
    pub payment_id: i64,
    pub loan_id: String,
    #[ts(type = "number")]
    pub installment_id: i64,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub remarks: Option<String>,
    pub utr: Option<String>,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Lead {
    #[ts(type = "number")]
    pub lead_id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[ts(type = "string | null")]
    pub requested_amount: Option<Decimal>,
    pub branch: Option<String>,
    pub source: Option<String>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub status: LeadStatus,
    #[ts(type = "number | null")]
    pub client_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Client {
    #[ts(type = "number")]
    pub client_id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub id_proof: Option<String>,
    pub branch: Option<String>,
    pub status: ClientStatus,
    #[ts(type = "number | null")]
    pub lead_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct User {
    #[ts(type = "number")]
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Noc {
    pub reference_no: String,
    pub loan_id: String,
    pub borrower_name: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Noc {
    /// 纯文本证明正文
    pub fn render_text(&self, loan: &Loan) -> String {
        let mut text = format!(
            "NO OBJECTION CERTIFICATE\n\
             Reference: {}\n\
             Date: {}\n\n\
             This is to certify that {} has repaid in full the loan {} of {} \
             disbursed on {}, with a total repayment of {}.\n\
             The loan account stands {} and no dues are outstanding.\n",
            self.reference_no,
            self.issued_at.format("%d-%m-%Y"),
            self.borrower_name,
            loan.loan_id,
            format_inr(loan.loan_amount),
            loan.date_of_disbursement.format("%d-%m-%Y"),
            format_inr(loan.repayment_amount),
            loan.status.as_ref().to_lowercase(),
        );
        if let Some(note) = &self.note {
            text.push_str(&format!("\nNote: {}\n", note));
        }
        text.push_str(&format!("\nIssued by: {}\n", self.issued_by));
        text
    }
}

/// `/loans/stats` 的贷款组合汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LoanStats {
    #[ts(type = "number")]
    pub total_loans: u64,
    #[ts(type = "number")]
    pub active: u64,
    #[ts(type = "number")]
    pub closed: u64,
    #[ts(type = "number")]
    pub foreclosed: u64,
    #[ts(type = "number")]
    pub defaulted: u64,
    #[ts(type = "string")]
    pub total_disbursed: Decimal,
    #[ts(type = "string")]
    pub total_repayment: Decimal,
    #[ts(type = "string")]
    pub total_collected: Decimal,
    #[ts(type = "number")]
    pub overdue_installments: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_loan_status_transitions() {
        use LoanStatus::*;
        assert!(Active.can_transition_to(Closed));
        assert!(Active.can_transition_to(Foreclosed));
        assert!(Active.can_transition_to(Default));
        assert!(Default.can_transition_to(Active));
        assert!(!Closed.can_transition_to(Active));
        assert!(!Foreclosed.can_transition_to(Closed));
        assert!(!Active.can_transition_to(Active));
        assert!(Closed.is_terminal());
        assert!(!Default.is_terminal());
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!(LoanStatus::from_str("closed").unwrap(), LoanStatus::Closed);
        assert_eq!(LeadStatus::from_str("inprocess").unwrap(), LeadStatus::InProcess);
        assert_eq!(PaymentMethod::from_str("UPI").unwrap(), PaymentMethod::Upi);
        assert!(UserRole::from_str("root").is_err());
        assert_eq!(LeadStatus::InProcess.as_ref(), "InProcess");
    }

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::Admin > UserRole::Manager);
        assert!(UserRole::Manager > UserRole::Employee);
    }

    #[test]
    fn test_utr_requirement() {
        assert!(PaymentMethod::Upi.requires_utr());
        assert!(PaymentMethod::Neft.requires_utr());
        assert!(!PaymentMethod::Cash.requires_utr());
        assert!(!PaymentMethod::Cheque.requires_utr());
    }

    #[test]
    fn test_outstanding_installment_statuses() {
        assert!(InstallmentStatus::Pending.is_outstanding());
        assert!(InstallmentStatus::Overdue.is_outstanding());
        assert!(InstallmentStatus::Bounced.is_outstanding());
        assert!(!InstallmentStatus::Paid.is_outstanding());
        assert!(!InstallmentStatus::Default.is_outstanding());
    }

    #[test]
    fn test_user_hash_not_serialized() {
        let now = Utc::now();
        let user = User {
            user_id: 1,
            name: "A".into(),
            email: "a@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: UserRole::Admin,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"Admin\""));
    }
}
