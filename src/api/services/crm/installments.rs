//! 分期接口

use actix_web::{HttpResponse, web};
use chrono::Utc;
use tracing::info;

use crate::api::middleware::AuthUser;
use crate::services::{GenerateInstallmentsRequest, Services, UpdateInstallmentRequest};
use crate::storage::UserRole;

use super::error_code::Domain;
use super::helpers::{api_created, api_result, error_from_crm, paginated_response};
use super::types::{ListInstallmentsQuery, MarkOverdueRequest, MarkOverdueResponse, Paged};

pub async fn list_installments(
    _user: AuthUser,
    query: web::Query<ListInstallmentsQuery>,
    services: web::Data<Services>,
) -> HttpResponse {
    let page = query.page_or_default();
    let page_size = query.page_size_or_default();
    let result = services
        .installments
        .list_installments(&query.to_filter(), page, page_size)
        .await;
    paginated_response(result, page, page_size, Domain::Installment)
}

pub async fn get_installment(
    _user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(
        services.installments.get_installment(path.into_inner()).await,
        Domain::Installment,
    )
}

pub async fn update_installment(
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<UpdateInstallmentRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    api_result(
        services
            .installments
            .update_installment(path.into_inner(), body.into_inner())
            .await,
        Domain::Installment,
    )
}

pub async fn generate_installments(
    user: AuthUser,
    body: web::Json<GenerateInstallmentsRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    let req = body.into_inner();
    info!(
        "API: {} generates installments for loan {} (replace: {})",
        user.name, req.loan_id, req.replace
    );
    api_created(services.installments.generate(req).await, Domain::Installment)
}

pub async fn mark_overdue(
    user: AuthUser,
    body: Option<web::Json<MarkOverdueRequest>>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    let as_of = body
        .and_then(|b| b.into_inner().as_of)
        .unwrap_or_else(|| Utc::now().date_naive());
    let result = services
        .installments
        .mark_overdue(as_of)
        .await
        .map(|marked| MarkOverdueResponse { as_of, marked });
    api_result(result, Domain::Installment)
}
