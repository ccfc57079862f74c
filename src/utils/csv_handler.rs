//! 贷款与线索的 CSV 导入导出
//!
//! HTTP 导入导出接口与 CLI 共用。读取时逐行独立解析，
//! 单行错误不会影响其他行

use std::io::{Read, Write};
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::errors::{CrmError, Result};
use crate::services::{CreateLeadRequest, CreateLoanRequest};
use crate::storage::{Lead, LeadStatus, Loan};
use crate::utils::money::parse_amount;

/// 解析后的一行数据
#[derive(Debug)]
pub struct ParsedRow<T> {
    /// 从 1 开始，不含表头
    pub row: usize,
    /// 贷款 ID 或手机号，用于错误报告
    pub key: String,
    pub item: Result<T>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanCsvRow {
    #[serde(default)]
    pub loan_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub sourced_by: String,
    #[serde(default)]
    pub loan_amount: String,
    #[serde(default)]
    pub processing_fee: String,
    #[serde(default)]
    pub gst: String,
    #[serde(default)]
    pub net_disbursement: String,
    #[serde(default)]
    pub roi: String,
    #[serde(default)]
    pub repayment_amount: String,
    #[serde(default)]
    pub interest_earned: String,
    #[serde(default)]
    pub tenure_days: String,
    #[serde(default)]
    pub date_of_disbursement: String,
    #[serde(default)]
    pub installment_amount: String,
    #[serde(default)]
    pub total_installments: String,
    #[serde(default)]
    pub status: String,
}

impl From<&Loan> for LoanCsvRow {
    fn from(loan: &Loan) -> Self {
        Self {
            loan_id: loan.loan_id.clone(),
            customer_name: loan.customer_name.clone(),
            branch: loan.branch.clone(),
            sourced_by: loan.sourced_by.clone().unwrap_or_default(),
            loan_amount: loan.loan_amount.to_string(),
            processing_fee: loan.processing_fee.to_string(),
            gst: loan.gst.to_string(),
            net_disbursement: loan.net_disbursement.to_string(),
            roi: loan.roi.to_string(),
            repayment_amount: loan.repayment_amount.to_string(),
            interest_earned: loan.interest_earned.to_string(),
            tenure_days: loan.tenure_days.to_string(),
            date_of_disbursement: loan.date_of_disbursement.format("%Y-%m-%d").to_string(),
            installment_amount: loan.installment_amount.to_string(),
            total_installments: loan.total_installments.to_string(),
            status: loan.status.to_string(),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn optional_amount(value: &str) -> Result<Option<rust_decimal::Decimal>> {
    non_empty(value).map(parse_amount).transpose()
}

fn optional_number<T: FromStr>(value: &str, field: &str) -> Result<Option<T>> {
    non_empty(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| CrmError::validation(format!("Invalid {}: '{}'", field, v)))
        })
        .transpose()
}

/// 支持 `YYYY-MM-DD`、`DD-MM-YYYY` 和 `DD/MM/YYYY`
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| CrmError::date_parse(format!("Unrecognized date: '{}'", raw)))
}

impl LoanCsvRow {
    /// 计算列（净放款额、利息、每期金额、状态）在导入时忽略并重新计算
    pub fn into_request(self) -> Result<CreateLoanRequest> {
        let loan_amount = non_empty(&self.loan_amount)
            .ok_or_else(|| CrmError::validation("loan_amount is required"))
            .and_then(parse_amount)?;
        let date = non_empty(&self.date_of_disbursement)
            .ok_or_else(|| CrmError::validation("date_of_disbursement is required"))
            .and_then(parse_date)?;

        Ok(CreateLoanRequest {
            loan_id: non_empty(&self.loan_id).map(str::to_string),
            client_id: None,
            customer_name: self.customer_name,
            branch: self.branch,
            sourced_by: non_empty(&self.sourced_by).map(str::to_string),
            loan_amount,
            processing_fee: optional_amount(&self.processing_fee)?.unwrap_or_default(),
            gst: optional_amount(&self.gst)?,
            roi: optional_amount(&self.roi)?,
            repayment_amount: optional_amount(&self.repayment_amount)?,
            tenure_days: optional_number(&self.tenure_days, "tenure_days")?,
            date_of_disbursement: date,
            total_installments: optional_number(&self.total_installments, "total_installments")?,
            generate_schedule: true,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadCsvRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub requested_amount: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: String,
}

impl From<&Lead> for LeadCsvRow {
    fn from(lead: &Lead) -> Self {
        Self {
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            email: lead.email.clone().unwrap_or_default(),
            requested_amount: lead
                .requested_amount
                .map(|a| a.to_string())
                .unwrap_or_default(),
            branch: lead.branch.clone().unwrap_or_default(),
            source: lead.source.clone().unwrap_or_default(),
            assigned_to: lead.assigned_to.clone().unwrap_or_default(),
            notes: lead.notes.clone().unwrap_or_default(),
            status: lead.status.to_string(),
        }
    }
}

impl LeadCsvRow {
    pub fn into_request(self) -> Result<CreateLeadRequest> {
        let status = non_empty(&self.status)
            .map(|s| {
                LeadStatus::from_str(&s.replace([' ', '-', '_'], ""))
                    .map_err(|_| CrmError::validation(format!("Unknown lead status '{}'", s)))
            })
            .transpose()?;

        Ok(CreateLeadRequest {
            name: self.name,
            phone: self.phone,
            email: non_empty(&self.email).map(str::to_string),
            requested_amount: optional_amount(&self.requested_amount)?,
            branch: non_empty(&self.branch).map(str::to_string),
            source: non_empty(&self.source).map(str::to_string),
            assigned_to: non_empty(&self.assigned_to).map(str::to_string),
            notes: non_empty(&self.notes).map(str::to_string),
            status,
        })
    }
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).flexible(true).trim(Trim::All);
    builder
}

fn read_rows<R, Row, T, K, C>(source: R, key_of: K, convert: C) -> Result<Vec<ParsedRow<T>>>
where
    R: Read,
    Row: for<'de> Deserialize<'de>,
    K: Fn(&Row) -> String,
    C: Fn(Row) -> Result<T>,
{
    let mut reader = reader_builder().from_reader(source);
    reader
        .headers()
        .map_err(|e| CrmError::csv_parse(format!("Cannot read CSV header: {}", e)))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<Row>().enumerate() {
        let row = idx + 1;
        let parsed = match record {
            Ok(raw) => {
                let key = key_of(&raw);
                ParsedRow {
                    row,
                    key,
                    item: convert(raw),
                }
            }
            Err(e) => ParsedRow {
                row,
                key: String::new(),
                item: Err(CrmError::csv_parse(e.to_string())),
            },
        };
        rows.push(parsed);
    }
    Ok(rows)
}

pub fn read_loan_rows<R: Read>(source: R) -> Result<Vec<ParsedRow<CreateLoanRequest>>> {
    read_rows(
        source,
        |row: &LoanCsvRow| row.loan_id.trim().to_string(),
        LoanCsvRow::into_request,
    )
}

pub fn read_lead_rows<R: Read>(source: R) -> Result<Vec<ParsedRow<CreateLeadRequest>>> {
    read_rows(
        source,
        |row: &LeadCsvRow| row.phone.trim().to_string(),
        LeadCsvRow::into_request,
    )
}

fn write_rows<W: Write, Row: Serialize>(sink: W, rows: impl Iterator<Item = Row>) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(sink);
    for row in rows {
        writer
            .serialize(&row)
            .map_err(|e| CrmError::serialization(format!("Failed to write CSV row: {}", e)))?;
    }
    writer
        .flush()
        .map_err(|e| CrmError::file_operation(format!("Failed to flush CSV: {}", e)))?;
    Ok(())
}

pub fn write_loans<W: Write>(sink: W, loans: &[Loan]) -> Result<()> {
    write_rows(sink, loans.iter().map(LoanCsvRow::from))
}

pub fn write_leads<W: Write>(sink: W, leads: &[Lead]) -> Result<()> {
    write_rows(sink, leads.iter().map(LeadCsvRow::from))
}

/// 例如 `loans_export_20240101_120000.csv`
pub fn generate_export_filename(kind: &str) -> String {
    format!(
        "{}_export_{}.csv",
        kind,
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}
