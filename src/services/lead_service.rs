//! 线索管理：录入、跟进编辑以及转化为客户

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use super::bulk::{ImportMode, ImportResult};
use crate::api::services::crm::TS_EXPORT_PATH;
use crate::errors::{CrmError, Result};
use crate::storage::{Client, ClientStatus, CrmStorage, Lead, LeadFilter, LeadStatus};
use crate::utils::csv_handler::ParsedRow;
use crate::utils::money::check_money;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateLeadRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[ts(type = "string | null")]
    pub requested_amount: Option<Decimal>,
    pub branch: Option<String>,
    pub source: Option<String>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    /// 默认为 Open
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(type = "string | null")]
    pub requested_amount: Option<Decimal>,
    pub branch: Option<String>,
    pub source: Option<String>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub status: Option<LeadStatus>,
}

/// 转化时补充的客户信息
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ConvertLeadRequest {
    pub address: Option<String>,
    pub id_proof: Option<String>,
}

/// 去除分隔符；7 到 15 位数字，可带前导 `+`
pub fn normalize_phone(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.len() < 7 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CrmError::validation(format!("Invalid phone number '{}'", raw.trim())));
    }
    Ok(cleaned)
}

pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn clean_email(value: Option<String>) -> Result<Option<String>> {
    match clean(value) {
        Some(email) if !email.contains('@') => {
            Err(CrmError::validation(format!("Invalid email '{}'", email)))
        }
        other => Ok(other.map(|e| e.to_lowercase())),
    }
}

fn check_amount(amount: Option<Decimal>) -> Result<()> {
    if let Some(amount) = amount {
        check_money(amount, "Requested amount")?;
    }
    if amount.is_some_and(|a| a <= Decimal::ZERO) {
        return Err(CrmError::validation("Requested amount must be positive"));
    }
    Ok(())
}

pub struct LeadService {
    storage: Arc<CrmStorage>,
}

impl LeadService {
    pub fn new(storage: Arc<CrmStorage>) -> Self {
        Self { storage }
    }

    fn build_lead(&self, req: CreateLeadRequest) -> Result<Lead> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(CrmError::validation("Lead name is required"));
        }
        let status = req.status.unwrap_or(LeadStatus::Open);
        if status == LeadStatus::Converted {
            return Err(CrmError::validation(
                "Leads become Converted only through conversion",
            ));
        }
        check_amount(req.requested_amount)?;

        let now = Utc::now();
        Ok(Lead {
            lead_id: 0,
            name,
            phone: normalize_phone(&req.phone)?,
            email: clean_email(req.email)?,
            requested_amount: req.requested_amount,
            branch: clean(req.branch),
            source: clean(req.source),
            assigned_to: clean(req.assigned_to),
            notes: clean(req.notes),
            status,
            client_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn create_lead(&self, req: CreateLeadRequest) -> Result<Lead> {
        let lead = self.storage.insert_lead(&self.build_lead(req)?).await?;
        info!("LeadService: created lead {} ({})", lead.lead_id, lead.name);
        Ok(lead)
    }

    pub async fn get_lead(&self, lead_id: i64) -> Result<Lead> {
        self.storage
            .get_lead(lead_id)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("Lead {} not found", lead_id)))
    }

    pub async fn list_leads(
        &self,
        filter: &LeadFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Lead>, u64)> {
        self.storage
            .list_leads(filter, page.max(1), page_size.clamp(1, 100))
            .await
    }

    pub async fn update_lead(&self, lead_id: i64, req: UpdateLeadRequest) -> Result<Lead> {
        let mut lead = self.get_lead(lead_id).await?;

        if lead.status == LeadStatus::Converted {
            if req.status.is_some_and(|s| s != LeadStatus::Converted) {
                return Err(CrmError::invalid_state(format!(
                    "Lead {} is converted; its status can no longer change",
                    lead_id
                )));
            }
        } else if req.status == Some(LeadStatus::Converted) {
            return Err(CrmError::invalid_state(
                "Use the convert endpoint to convert a lead",
            ));
        }

        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CrmError::validation("Lead name cannot be empty"));
            }
            lead.name = name;
        }
        if let Some(phone) = req.phone {
            lead.phone = normalize_phone(&phone)?;
        }
        if req.email.is_some() {
            lead.email = clean_email(req.email)?;
        }
        if req.requested_amount.is_some() {
            check_amount(req.requested_amount)?;
            lead.requested_amount = req.requested_amount;
        }
        if req.branch.is_some() {
            lead.branch = clean(req.branch);
        }
        if req.source.is_some() {
            lead.source = clean(req.source);
        }
        if req.assigned_to.is_some() {
            lead.assigned_to = clean(req.assigned_to);
        }
        if req.notes.is_some() {
            lead.notes = clean(req.notes);
        }
        if let Some(status) = req.status {
            lead.status = status;
        }
        lead.updated_at = Utc::now();

        let lead = self.storage.update_lead(&lead).await?;
        info!("LeadService: updated lead {}", lead_id);
        Ok(lead)
    }

    /// 根据线索创建客户，并将线索标记为 Converted
    pub async fn convert_lead(
        &self,
        lead_id: i64,
        req: ConvertLeadRequest,
    ) -> Result<(Lead, Client)> {
        let lead = self.get_lead(lead_id).await?;
        match lead.status {
            LeadStatus::Converted => {
                return Err(CrmError::conflict(format!(
                    "Lead {} is already converted to client {}",
                    lead_id,
                    lead.client_id.map(|id| id.to_string()).unwrap_or_default()
                )));
            }
            LeadStatus::Rejected => {
                return Err(CrmError::invalid_state(format!(
                    "Lead {} was rejected and cannot be converted",
                    lead_id
                )));
            }
            LeadStatus::Open | LeadStatus::InProcess => {}
        }

        let now = Utc::now();
        let client = Client {
            client_id: 0,
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            email: lead.email.clone(),
            address: clean(req.address),
            id_proof: clean(req.id_proof),
            branch: lead.branch.clone(),
            status: ClientStatus::Active,
            lead_id: Some(lead_id),
            created_at: now,
            updated_at: now,
        };

        self.storage.convert_lead(lead_id, &client).await
    }

    pub async fn export_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>> {
        self.storage.list_all_leads(filter).await
    }

    /// 导入时以手机号作为线索的键
    pub async fn import_leads(
        &self,
        rows: Vec<ParsedRow<CreateLeadRequest>>,
        mode: ImportMode,
    ) -> ImportResult {
        let mut result = ImportResult {
            total_rows: rows.len(),
            ..ImportResult::default()
        };

        for parsed in rows {
            let outcome = match parsed.item {
                Ok(req) => self.import_one(req, mode).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(true) => result.success_count += 1,
                Ok(false) => result.skipped_count += 1,
                Err(e) => result.fail(parsed.row, parsed.key, e.message()),
            }
        }

        info!(
            "LeadService: import finished, {} rows, {} imported, {} skipped, {} failed",
            result.total_rows, result.success_count, result.skipped_count, result.failed_count
        );
        result
    }

    async fn import_one(&self, req: CreateLeadRequest, mode: ImportMode) -> Result<bool> {
        let lead = self.build_lead(req)?;
        let Some(existing) = self.storage.find_lead_by_phone(&lead.phone).await? else {
            self.storage.insert_lead(&lead).await?;
            return Ok(true);
        };

        match mode {
            ImportMode::Skip => Ok(false),
            ImportMode::Error => Err(CrmError::conflict(format!(
                "Lead with phone {} already exists",
                lead.phone
            ))),
            ImportMode::Overwrite => {
                if existing.status == LeadStatus::Converted {
                    return Err(CrmError::invalid_state(format!(
                        "Lead {} is converted and cannot be overwritten",
                        existing.lead_id
                    )));
                }
                let merged = Lead {
                    lead_id: existing.lead_id,
                    client_id: existing.client_id,
                    created_at: existing.created_at,
                    ..lead
                };
                self.storage.update_lead(&merged).await?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(" 98000-00000 ").unwrap(), "9800000000");
        assert_eq!(normalize_phone("+91 98000 00000").unwrap(), "+919800000000");
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("98000abc00").is_err());
    }

    #[test]
    fn test_clean_email() {
        assert_eq!(
            clean_email(Some(" Ravi@Example.COM ".into())).unwrap(),
            Some("ravi@example.com".into())
        );
        assert_eq!(clean_email(Some("  ".into())).unwrap(), None);
        assert!(clean_email(Some("not-an-email".into())).is_err());
    }
}
