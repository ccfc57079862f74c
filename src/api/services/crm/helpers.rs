//! CRM 处理器共用的响应构建函数

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use serde::Serialize;
use tracing::error;

use crate::errors::CrmError;

use super::error_code::{Domain, ErrorCode};
use super::types::{ApiResponse, PaginatedResponse, PaginationInfo};

pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 将 `CrmError` 映射为 HTTP 状态码和对应领域的错误码
///
/// 服务端错误只写日志，不向客户端返回细节
pub fn error_from_crm(err: &CrmError, domain: Option<Domain>) -> HttpResponse {
    let status = err.http_status();
    let code = match domain {
        Some(domain) => ErrorCode::for_domain(err, domain),
        None => ErrorCode::from(err),
    };
    if status.is_server_error() {
        error!("API error {}: {}", err.code(), err);
        return error_response(status, code, "Internal server error");
    }
    error_response(status, code, err.message())
}

/// `Ok` 返回 200 和数据，`Err` 交给 `error_from_crm` 处理
pub fn api_result<T, E>(result: Result<T, E>, domain: Domain) -> HttpResponse
where
    T: Serialize,
    E: Into<CrmError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_crm(&e.into(), Some(domain)),
    }
}

/// 与 `api_result` 相同，但成功时返回 201
pub fn api_created<T, E>(result: Result<T, E>, domain: Domain) -> HttpResponse
where
    T: Serialize,
    E: Into<CrmError>,
{
    match result {
        Ok(data) => created_response(data),
        Err(e) => error_from_crm(&e.into(), Some(domain)),
    }
}

/// 带 `pagination` 的列表响应
pub fn paginated_response<T: Serialize>(
    result: Result<(Vec<T>, u64), CrmError>,
    page: u64,
    page_size: u64,
    domain: Domain,
) -> HttpResponse {
    match result {
        Ok((items, total)) => HttpResponse::Ok()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(PaginatedResponse {
                code: ErrorCode::Success as i32,
                message: "OK".to_string(),
                data: items,
                pagination: PaginationInfo::new(page, page_size, total),
            }),
        Err(e) => error_from_crm(&e, Some(domain)),
    }
}

/// 让提取器和处理器中的 `?` 以 JSON 响应格式返回错误
impl ResponseError for CrmError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        error_from_crm(self, None)
    }
}

/// JSON 请求体提取器，解析失败时以统一响应格式返回
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req: &HttpRequest| {
            let message = format!("Invalid request body: {}", err);
            let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
            InternalError::from_response(err, response).into()
        })
}

/// 查询参数提取器，错误格式相同
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = format!("Invalid query: {}", err);
        let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
        InternalError::from_response(err, response).into()
    })
}
