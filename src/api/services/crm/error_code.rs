//! API 错误码

use serde_repr::{Deserialize_repr, Serialize_repr};
use ts_rs::TS;

use super::types::TS_EXPORT_PATH;
use crate::errors::CrmError;

/// 响应中携带的数字错误码
///
/// 按千位分组：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证
/// - 3000-3099: 贷款
/// - 4000-4099: 分期与还款
/// - 5000-5099: 导入导出
/// - 6000-6099: 线索、客户、用户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[ts(rename = "ErrorCode")]
#[ts(repr(enum))]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    BatchSizeTooLarge = 1010,
    FileTooLarge = 1011,
    InvalidDateFormat = 1012,
    InvalidState = 1022,
    ServiceUnavailable = 1030,

    AuthFailed = 2000,
    TokenExpired = 2001,
    TokenInvalid = 2002,
    InsufficientRole = 2003,

    LoanNotFound = 3000,
    LoanAlreadyExists = 3001,
    LoanInvalidTerms = 3002,
    LoanInvalidState = 3003,
    NocNotFound = 3004,
    NocAlreadyIssued = 3005,

    InstallmentNotFound = 4000,
    InstallmentAlreadyPaid = 4001,
    ScheduleLocked = 4002,
    ScheduleExists = 4003,
    PaymentNotFound = 4004,
    PaymentInvalid = 4005,
    PaymentNotAccepted = 4006,

    ImportFailed = 5000,
    ExportFailed = 5001,
    InvalidMultipartData = 5002,
    FileReadError = 5003,
    CsvFileMissing = 5004,
    CsvParseError = 5005,
    CsvGenerationError = 5006,

    LeadNotFound = 6000,
    LeadConflict = 6001,
    LeadNotConvertible = 6002,
    ClientNotFound = 6003,
    UserNotFound = 6004,
    UserAlreadyExists = 6005,
}

impl From<CrmError> for ErrorCode {
    fn from(err: CrmError) -> Self {
        ErrorCode::from(&err)
    }
}

impl From<&CrmError> for ErrorCode {
    fn from(err: &CrmError) -> Self {
        match err {
            CrmError::Validation(_) => ErrorCode::BadRequest,
            CrmError::NotFound(_) => ErrorCode::NotFound,
            CrmError::Conflict(_) => ErrorCode::Conflict,
            CrmError::InvalidState(_) => ErrorCode::InvalidState,
            CrmError::Unauthorized(_) => ErrorCode::Unauthorized,
            CrmError::Forbidden(_) => ErrorCode::Forbidden,
            CrmError::DateParse(_) => ErrorCode::InvalidDateFormat,
            CrmError::CsvParse(_) => ErrorCode::CsvParseError,
            CrmError::Serialization(_) => ErrorCode::BadRequest,
            CrmError::FileOperation(_) => ErrorCode::FileReadError,
            CrmError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            CrmError::DatabaseConfig(_) | CrmError::DatabaseOperation(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}

/// 处理器操作的资源，用于把通用错误细化为该资源的错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Loan,
    Noc,
    Installment,
    Payment,
    Lead,
    Client,
    User,
}

impl ErrorCode {
    pub fn for_domain(err: &CrmError, domain: Domain) -> Self {
        use CrmError::*;
        match (domain, err) {
            (Domain::Loan, NotFound(_)) => ErrorCode::LoanNotFound,
            (Domain::Loan, Conflict(_)) => ErrorCode::LoanAlreadyExists,
            (Domain::Loan, Validation(_)) => ErrorCode::LoanInvalidTerms,
            (Domain::Loan, InvalidState(_)) => ErrorCode::LoanInvalidState,
            (Domain::Noc, NotFound(_)) => ErrorCode::NocNotFound,
            (Domain::Noc, Conflict(_)) => ErrorCode::NocAlreadyIssued,
            (Domain::Noc, InvalidState(_)) => ErrorCode::LoanInvalidState,
            (Domain::Installment, NotFound(_)) => ErrorCode::InstallmentNotFound,
            (Domain::Installment, Conflict(_)) => ErrorCode::ScheduleExists,
            (Domain::Installment, InvalidState(_)) => ErrorCode::ScheduleLocked,
            (Domain::Payment, NotFound(_)) => ErrorCode::PaymentNotFound,
            (Domain::Payment, Conflict(_)) => ErrorCode::InstallmentAlreadyPaid,
            (Domain::Payment, Validation(_)) => ErrorCode::PaymentInvalid,
            (Domain::Payment, InvalidState(_)) => ErrorCode::PaymentNotAccepted,
            (Domain::Lead, NotFound(_)) => ErrorCode::LeadNotFound,
            (Domain::Lead, Conflict(_)) => ErrorCode::LeadConflict,
            (Domain::Lead, InvalidState(_)) => ErrorCode::LeadNotConvertible,
            (Domain::Client, NotFound(_)) => ErrorCode::ClientNotFound,
            (Domain::User, NotFound(_)) => ErrorCode::UserNotFound,
            (Domain::User, Conflict(_)) => ErrorCode::UserAlreadyExists,
            _ => ErrorCode::from(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&ErrorCode::LoanNotFound).unwrap(),
            "3000"
        );
        let code: ErrorCode = serde_json::from_str("5005").unwrap();
        assert_eq!(code, ErrorCode::CsvParseError);
    }

    #[test]
    fn test_from_crm_error() {
        assert_eq!(
            ErrorCode::from(CrmError::validation("x")),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ErrorCode::from(CrmError::conflict("x")),
            ErrorCode::Conflict
        );
        assert_eq!(
            ErrorCode::from(CrmError::database_operation("x")),
            ErrorCode::InternalServerError
        );
    }

    #[test]
    fn test_for_domain() {
        assert_eq!(
            ErrorCode::for_domain(&CrmError::not_found("x"), Domain::Loan),
            ErrorCode::LoanNotFound
        );
        assert_eq!(
            ErrorCode::for_domain(&CrmError::conflict("x"), Domain::Payment),
            ErrorCode::InstallmentAlreadyPaid
        );
        // 不属于该领域的错误沿用通用映射
        assert_eq!(
            ErrorCode::for_domain(&CrmError::database_operation("x"), Domain::Lead),
            ErrorCode::InternalServerError
        );
    }
}
