//! 贷款与线索的 CSV 导入导出

use std::io::Cursor;
use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use tracing::{error, info};

use crate::api::middleware::AuthUser;
use crate::config::get_config;
use crate::errors::CrmError;
use crate::services::{ImportMode, Services};
use crate::storage::{Lead, Loan, UserRole};
use crate::utils::csv_handler::{
    generate_export_filename, read_lead_rows, read_loan_rows, write_leads, write_loans,
};

use super::error_code::{Domain, ErrorCode};
use super::helpers::{error_from_crm, error_response, success_response};
use super::types::{ListLeadsQuery, ListLoansQuery};

/// `overwrite` 的长度再加上空白余量
const MAX_MODE_FIELD_LEN: usize = 32;

/// 在异步工作线程之外序列化，以 CSV 附件返回
async fn csv_attachment<T, F>(items: Vec<T>, kind: &'static str, write: F) -> HttpResponse
where
    T: Send + 'static,
    F: FnOnce(&mut Vec<u8>, &[T]) -> Result<(), CrmError> + Send + 'static,
{
    let count = items.len();
    let rendered = tokio::task::spawn_blocking(move || {
        let mut buf = Vec::new();
        write(&mut buf, &items).map(|_| buf)
    })
    .await;

    let body = match rendered {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            error!("CSV export of {} failed: {}", kind, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::CsvGenerationError,
                "CSV generation error",
            );
        }
        Err(e) => {
            error!("CSV export task panicked: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::ExportFailed,
                "CSV task failed",
            );
        }
    };

    let filename = generate_export_filename(kind);
    info!("API: exported {} {} to {}", count, kind, filename);

    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body)
}

pub async fn export_loans(
    user: AuthUser,
    query: web::Query<ListLoansQuery>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    match services.loans.export_loans(&query.to_filter()).await {
        Ok(loans) => {
            csv_attachment(loans, "loans", |buf, loans: &[Loan]| {
                write_loans(buf, loans)
            })
            .await
        }
        Err(e) => error_from_crm(&e, Some(Domain::Loan)),
    }
}

pub async fn export_leads(
    user: AuthUser,
    query: web::Query<ListLeadsQuery>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    match services.leads.export_leads(&query.to_filter()).await {
        Ok(leads) => {
            csv_attachment(leads, "leads", |buf, leads: &[Lead]| {
                write_leads(buf, leads)
            })
            .await
        }
        Err(e) => error_from_crm(&e, Some(Domain::Lead)),
    }
}

/// 导入表单中的上传文件和冲突模式
struct ImportForm {
    data: Vec<u8>,
    mode: ImportMode,
}

/// 读取 `file` 和 `mode` 字段，并限制上传大小
async fn read_import_form(mut payload: Multipart) -> Result<ImportForm, HttpResponse> {
    let max_size = get_config().api.max_import_file_size;
    let mut csv_data: Option<Vec<u8>> = None;
    let mut mode = ImportMode::default();

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to parse multipart field: {}", e);
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidMultipartData,
                    &format!("Invalid multipart data: {}", e),
                ));
            }
        };

        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let mut data = Vec::new();
                while let Some(chunk) = field.next().await {
                    match chunk {
                        Ok(bytes) => {
                            if data.len() + bytes.len() > max_size {
                                return Err(error_response(
                                    StatusCode::PAYLOAD_TOO_LARGE,
                                    ErrorCode::FileTooLarge,
                                    &format!(
                                        "File size exceeds maximum {} MB",
                                        max_size / 1024 / 1024
                                    ),
                                ));
                            }
                            data.extend_from_slice(&bytes);
                        }
                        Err(e) => {
                            error!("Failed to read file chunk: {}", e);
                            return Err(error_response(
                                StatusCode::BAD_REQUEST,
                                ErrorCode::FileReadError,
                                &format!("Failed to read file: {}", e),
                            ));
                        }
                    }
                }
                csv_data = Some(data);
            }
            "mode" => {
                let mut data = Vec::new();
                while let Some(chunk) = field.next().await {
                    match chunk {
                        Ok(bytes) => {
                            if data.len() + bytes.len() > MAX_MODE_FIELD_LEN {
                                return Err(error_response(
                                    StatusCode::BAD_REQUEST,
                                    ErrorCode::BadRequest,
                                    "Import mode value is too long",
                                ));
                            }
                            data.extend_from_slice(&bytes);
                        }
                        Err(e) => {
                            error!("Failed to read mode field: {}", e);
                            return Err(error_response(
                                StatusCode::BAD_REQUEST,
                                ErrorCode::InvalidMultipartData,
                                &format!("Failed to read mode: {}", e),
                            ));
                        }
                    }
                }
                let raw = String::from_utf8_lossy(&data).trim().to_string();
                if !raw.is_empty() {
                    mode = ImportMode::from_str(&raw).map_err(|_| {
                        error_response(
                            StatusCode::BAD_REQUEST,
                            ErrorCode::BadRequest,
                            &format!(
                                "Unknown import mode '{}'; use skip, overwrite or error",
                                raw
                            ),
                        )
                    })?;
                }
            }
            // 忽略未知字段
            _ => {}
        }
    }

    match csv_data {
        Some(data) if !data.is_empty() => Ok(ImportForm { data, mode }),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::CsvFileMissing,
            "No CSV file provided",
        )),
    }
}

pub async fn import_loans(
    user: AuthUser,
    payload: Multipart,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    let form = match read_import_form(payload).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    info!(
        "API: {} imports loans, mode={}, {} bytes",
        user.name,
        form.mode,
        form.data.len()
    );

    let rows = match read_loan_rows(Cursor::new(form.data)) {
        Ok(rows) => rows,
        Err(e) => return error_from_crm(&e, None),
    };
    success_response(services.loans.import_loans(rows, form.mode).await)
}

pub async fn import_leads(
    user: AuthUser,
    payload: Multipart,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    let form = match read_import_form(payload).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    info!(
        "API: {} imports leads, mode={}, {} bytes",
        user.name,
        form.mode,
        form.data.len()
    );

    let rows = match read_lead_rows(Cursor::new(form.data)) {
        Ok(rows) => rows,
        Err(e) => return error_from_crm(&e, None),
    };
    success_response(services.leads.import_leads(rows, form.mode).await)
}
