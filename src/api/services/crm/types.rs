//! CRM API 请求/响应类型

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::storage::{
    ClientFilter, ClientStatus, InstallmentFilter, InstallmentStatus, LeadFilter, LeadStatus,
    LoanFilter, LoanStatus, PaymentFilter, PaymentMethod, User, UserFilter, UserRole, UserStatus,
};

/// 为 Web 前端生成的 TypeScript 类型
pub const TS_EXPORT_PATH: &str = "../web/src/services/crm.generated.ts";

pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PaginationInfo {
    #[ts(type = "number")]
    pub page: u64,
    #[ts(type = "number")]
    pub page_size: u64,
    #[ts(type = "number")]
    pub total: u64,
    #[ts(type = "number")]
    pub total_pages: u64,
}

impl PaginationInfo {
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        let page_size = page_size.max(1);
        Self {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

/// 所有列表查询共用的 `page` / `page_size`
pub trait Paged {
    fn page(&self) -> Option<u64>;
    fn page_size(&self) -> Option<u64>;

    fn page_or_default(&self) -> u64 {
        self.page().unwrap_or(1).max(1)
    }

    fn page_size_or_default(&self) -> u64 {
        self.page_size().unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100)
    }
}

macro_rules! impl_paged {
    ($($ty:ty),+ $(,)?) => {
        $(impl Paged for $ty {
            fn page(&self) -> Option<u64> {
                self.page
            }
            fn page_size(&self) -> Option<u64> {
                self.page_size
            }
        })+
    };
}

#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ListLoansQuery {
    #[ts(type = "number | null")]
    pub page: Option<u64>,
    #[ts(type = "number | null")]
    pub page_size: Option<u64>,
    pub status: Option<LoanStatus>,
    pub branch: Option<String>,
    pub search: Option<String>,
    pub disbursed_from: Option<NaiveDate>,
    pub disbursed_to: Option<NaiveDate>,
    #[ts(type = "number | null")]
    pub client_id: Option<i64>,
}

impl ListLoansQuery {
    pub fn to_filter(&self) -> LoanFilter {
        LoanFilter {
            status: self.status,
            branch: non_empty(&self.branch),
            search: non_empty(&self.search),
            disbursed_from: self.disbursed_from,
            disbursed_to: self.disbursed_to,
            client_id: self.client_id,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ListInstallmentsQuery {
    #[ts(type = "number | null")]
    pub page: Option<u64>,
    #[ts(type = "number | null")]
    pub page_size: Option<u64>,
    pub loan_id: Option<String>,
    pub status: Option<InstallmentStatus>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}

impl ListInstallmentsQuery {
    pub fn to_filter(&self) -> InstallmentFilter {
        InstallmentFilter {
            loan_id: non_empty(&self.loan_id),
            status: self.status,
            due_from: self.due_from,
            due_to: self.due_to,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ListPaymentsQuery {
    #[ts(type = "number | null")]
    pub page: Option<u64>,
    #[ts(type = "number | null")]
    pub page_size: Option<u64>,
    pub loan_id: Option<String>,
    pub method: Option<PaymentMethod>,
    pub paid_from: Option<NaiveDate>,
    pub paid_to: Option<NaiveDate>,
}

impl ListPaymentsQuery {
    pub fn to_filter(&self) -> PaymentFilter {
        PaymentFilter {
            loan_id: non_empty(&self.loan_id),
            method: self.method,
            paid_from: self.paid_from,
            paid_to: self.paid_to,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ListLeadsQuery {
    #[ts(type = "number | null")]
    pub page: Option<u64>,
    #[ts(type = "number | null")]
    pub page_size: Option<u64>,
    pub status: Option<LeadStatus>,
    pub branch: Option<String>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
}

impl ListLeadsQuery {
    pub fn to_filter(&self) -> LeadFilter {
        LeadFilter {
            status: self.status,
            branch: non_empty(&self.branch),
            assigned_to: non_empty(&self.assigned_to),
            search: non_empty(&self.search),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ListClientsQuery {
    #[ts(type = "number | null")]
    pub page: Option<u64>,
    #[ts(type = "number | null")]
    pub page_size: Option<u64>,
    pub status: Option<ClientStatus>,
    pub branch: Option<String>,
    pub search: Option<String>,
}

impl ListClientsQuery {
    pub fn to_filter(&self) -> ClientFilter {
        ClientFilter {
            status: self.status,
            branch: non_empty(&self.branch),
            search: non_empty(&self.search),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ListUsersQuery {
    #[ts(type = "number | null")]
    pub page: Option<u64>,
    #[ts(type = "number | null")]
    pub page_size: Option<u64>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl ListUsersQuery {
    pub fn to_filter(&self) -> UserFilter {
        UserFilter {
            role: self.role,
            status: self.status,
        }
    }
}

impl_paged!(
    ListLoansQuery,
    ListInstallmentsQuery,
    ListPaymentsQuery,
    ListLeadsQuery,
    ListClientsQuery,
    ListUsersQuery,
);

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct StatusUpdateRequest {
    pub status: LoanStatus,
    /// 即使有未还分期也强制结清
    #[serde(default)]
    pub force: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BulkCloseRequest {
    pub loan_ids: Vec<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MarkOverdueRequest {
    /// 默认为今天
    pub as_of: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MarkOverdueResponse {
    pub as_of: NaiveDate,
    #[ts(type = "number")]
    pub marked: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ConvertLeadResponse {
    pub lead: crate::storage::Lead,
    pub client: crate::storage::Client,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_info_total_pages() {
        assert_eq!(PaginationInfo::new(1, 20, 0).total_pages, 0);
        assert_eq!(PaginationInfo::new(1, 20, 20).total_pages, 1);
        assert_eq!(PaginationInfo::new(1, 20, 21).total_pages, 2);
    }

    #[test]
    fn test_paged_defaults_and_clamp() {
        let query = ListLoansQuery::default();
        assert_eq!(query.page_or_default(), 1);
        assert_eq!(query.page_size_or_default(), DEFAULT_PAGE_SIZE);

        let query = ListLoansQuery {
            page: Some(0),
            page_size: Some(1000),
            ..Default::default()
        };
        assert_eq!(query.page_or_default(), 1);
        assert_eq!(query.page_size_or_default(), 100);
    }

    #[test]
    fn test_filter_drops_blank_text() {
        let query = ListLeadsQuery {
            branch: Some("   ".to_string()),
            search: Some(" 98765 ".to_string()),
            ..Default::default()
        };
        let filter = query.to_filter();
        assert_eq!(filter.branch, None);
        assert_eq!(filter.search.as_deref(), Some("98765"));
    }
}
