use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    InvalidState(String),
    Unauthorized(String),
    Forbidden(String),
    Serialization(String),
    DateParse(String),
    CsvParse(String),
}

impl CrmError {
    /// 稳定的错误码，用于 CLI 输出和日志
    pub fn code(&self) -> &'static str {
        match self {
            CrmError::DatabaseConfig(_) => "E001",
            CrmError::DatabaseConnection(_) => "E002",
            CrmError::DatabaseOperation(_) => "E003",
            CrmError::FileOperation(_) => "E004",
            CrmError::Validation(_) => "E005",
            CrmError::NotFound(_) => "E006",
            CrmError::Conflict(_) => "E007",
            CrmError::InvalidState(_) => "E008",
            CrmError::Unauthorized(_) => "E009",
            CrmError::Forbidden(_) => "E010",
            CrmError::Serialization(_) => "E011",
            CrmError::DateParse(_) => "E012",
            CrmError::CsvParse(_) => "E013",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            CrmError::DatabaseConfig(_) => "Database Configuration Error",
            CrmError::DatabaseConnection(_) => "Database Connection Error",
            CrmError::DatabaseOperation(_) => "Database Operation Error",
            CrmError::FileOperation(_) => "File Operation Error",
            CrmError::Validation(_) => "Validation Error",
            CrmError::NotFound(_) => "Resource Not Found",
            CrmError::Conflict(_) => "Conflict",
            CrmError::InvalidState(_) => "Invalid State",
            CrmError::Unauthorized(_) => "Unauthorized",
            CrmError::Forbidden(_) => "Forbidden",
            CrmError::Serialization(_) => "Serialization Error",
            CrmError::DateParse(_) => "Date Parse Error",
            CrmError::CsvParse(_) => "CSV Parse Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CrmError::DatabaseConfig(msg)
            | CrmError::DatabaseConnection(msg)
            | CrmError::DatabaseOperation(msg)
            | CrmError::FileOperation(msg)
            | CrmError::Validation(msg)
            | CrmError::NotFound(msg)
            | CrmError::Conflict(msg)
            | CrmError::InvalidState(msg)
            | CrmError::Unauthorized(msg)
            | CrmError::Forbidden(msg)
            | CrmError::Serialization(msg)
            | CrmError::DateParse(msg)
            | CrmError::CsvParse(msg) => msg,
        }
    }

    /// 错误到达 API 层时使用的 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            CrmError::Validation(_)
            | CrmError::Serialization(_)
            | CrmError::DateParse(_)
            | CrmError::CsvParse(_) => StatusCode::BAD_REQUEST,
            CrmError::NotFound(_) => StatusCode::NOT_FOUND,
            CrmError::Conflict(_) => StatusCode::CONFLICT,
            CrmError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CrmError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CrmError::Forbidden(_) => StatusCode::FORBIDDEN,
            CrmError::DatabaseConfig(_)
            | CrmError::DatabaseConnection(_)
            | CrmError::DatabaseOperation(_)
            | CrmError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 服务器启动失败时的彩色输出
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for CrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CrmError {}

impl CrmError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        CrmError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        CrmError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        CrmError::DatabaseOperation(msg.into())
    }

    /// 插入失败；唯一键冲突返回 `Conflict` 而不是 500
    pub fn insert_failed(err: sea_orm::DbErr, context: impl std::fmt::Display) -> Self {
        if is_unique_violation(&err) {
            CrmError::Conflict(format!("{}: record already exists", context))
        } else {
            CrmError::DatabaseOperation(format!("{}: {}", context, err))
        }
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        CrmError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        CrmError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        CrmError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        CrmError::Conflict(msg.into())
    }

    pub fn invalid_state<T: Into<String>>(msg: T) -> Self {
        CrmError::InvalidState(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        CrmError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        CrmError::Forbidden(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        CrmError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        CrmError::DateParse(msg.into())
    }

    pub fn csv_parse<T: Into<String>>(msg: T) -> Self {
        CrmError::CsvParse(msg.into())
    }
}

/// 判断是否为主键或唯一索引冲突（MySQL / PostgreSQL / SQLite）
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    if matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ) {
        return true;
    }
    // SQLite 主键冲突使用单独的扩展错误码
    let text = err.to_string();
    text.contains("UNIQUE constraint failed") || text.contains("PRIMARY KEY constraint failed")
}

impl From<sea_orm::DbErr> for CrmError {
    fn from(err: sea_orm::DbErr) -> Self {
        CrmError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for CrmError {
    fn from(err: std::io::Error) -> Self {
        CrmError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for CrmError {
    fn from(err: serde_json::Error) -> Self {
        CrmError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for CrmError {
    fn from(err: chrono::ParseError) -> Self {
        CrmError::DateParse(err.to_string())
    }
}

impl From<csv::Error> for CrmError {
    fn from(err: csv::Error) -> Self {
        CrmError::CsvParse(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for CrmError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        CrmError::Unauthorized(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            CrmError::database_config(""),
            CrmError::database_connection(""),
            CrmError::database_operation(""),
            CrmError::file_operation(""),
            CrmError::validation(""),
            CrmError::not_found(""),
            CrmError::conflict(""),
            CrmError::invalid_state(""),
            CrmError::unauthorized(""),
            CrmError::forbidden(""),
            CrmError::serialization(""),
            CrmError::date_parse(""),
            CrmError::csv_parse(""),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            CrmError::validation("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(CrmError::not_found("x").http_status(), StatusCode::NOT_FOUND);
        assert_eq!(CrmError::conflict("x").http_status(), StatusCode::CONFLICT);
        assert_eq!(
            CrmError::invalid_state("x").http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            CrmError::database_operation("x").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_format_simple() {
        let err = CrmError::not_found("Loan LN1 not found");
        assert_eq!(err.format_simple(), "Resource Not Found: Loan LN1 not found");
        assert_eq!(err.to_string(), err.format_simple());
    }

    #[test]
    fn test_from_db_err() {
        let err: CrmError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(matches!(err, CrmError::DatabaseOperation(_)));
    }
}
