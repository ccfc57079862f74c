//! 已结清贷款的无异议证明（NOC）

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::api::services::crm::TS_EXPORT_PATH;
use crate::errors::{CrmError, Result};
use crate::storage::{CrmStorage, Noc};
use crate::utils::generate_random_code;

const REFERENCE_SUFFIX_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct IssueNocRequest {
    pub note: Option<String>,
}

/// 证明记录及其可打印文本
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct NocDocument {
    pub noc: Noc,
    pub text: String,
}

/// `NOC-YYYYMMDD-XXXXXX`
pub fn generate_reference(issued_at: DateTime<Utc>) -> String {
    format!(
        "NOC-{}-{}",
        issued_at.format("%Y%m%d"),
        generate_random_code(REFERENCE_SUFFIX_LEN)
    )
}

pub struct NocService {
    storage: Arc<CrmStorage>,
}

impl NocService {
    pub fn new(storage: Arc<CrmStorage>) -> Self {
        Self { storage }
    }

    /// 签发贷款证明，贷款必须为 Closed 或 Foreclosed
    pub async fn issue_noc(
        &self,
        loan_id: &str,
        req: IssueNocRequest,
        issued_by: &str,
    ) -> Result<NocDocument> {
        let loan = self
            .storage
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("Loan {} not found", loan_id)))?;
        if !loan.status.is_terminal() {
            return Err(CrmError::invalid_state(format!(
                "Loan {} is {}; a NOC needs a Closed or Foreclosed loan",
                loan_id, loan.status
            )));
        }
        if let Some(existing) = self.storage.get_noc_by_loan(loan_id).await? {
            return Err(CrmError::conflict(format!(
                "NOC {} was already issued for loan {}",
                existing.reference_no, loan_id
            )));
        }

        let issued_at = Utc::now();
        let mut reference_no = generate_reference(issued_at);
        while self.storage.noc_reference_exists(&reference_no).await? {
            reference_no = generate_reference(issued_at);
        }

        let noc = Noc {
            reference_no,
            loan_id: loan.loan_id.clone(),
            borrower_name: loan.customer_name.clone(),
            issued_by: issued_by.to_string(),
            issued_at,
            note: req
                .note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        };
        let noc = self.storage.insert_noc(&noc).await?;
        info!(
            "NocService: {} issued for loan {} by {}",
            noc.reference_no, loan_id, issued_by
        );

        let text = noc.render_text(&loan);
        Ok(NocDocument { noc, text })
    }

    pub async fn get_noc(&self, loan_id: &str) -> Result<NocDocument> {
        let loan = self
            .storage
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("Loan {} not found", loan_id)))?;
        let noc = self
            .storage
            .get_noc_by_loan(loan_id)
            .await?
            .ok_or_else(|| {
                CrmError::not_found(format!("No NOC has been issued for loan {}", loan_id))
            })?;
        let text = noc.render_text(&loan);
        Ok(NocDocument { noc, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reference_format() {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap();
        let reference = generate_reference(at);
        assert!(reference.starts_with("NOC-20240517-"));
        assert_eq!(reference.len(), "NOC-20240517-".len() + 6);
        assert!(
            reference[13..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }
}
