//! 贷款接口，包括贷款的分期、还款和 NOC

use actix_web::{HttpResponse, web};
use tracing::{info, trace};

use crate::api::middleware::AuthUser;
use crate::config::get_config;
use crate::services::{CreateLoanRequest, IssueNocRequest, Services, UpdateLoanRequest};
use crate::storage::UserRole;

use super::error_code::{Domain, ErrorCode};
use super::helpers::{
    api_created, api_result, error_from_crm, error_response, paginated_response, success_response,
};
use super::types::{BulkCloseRequest, ListLoansQuery, Paged, StatusUpdateRequest};

pub async fn list_loans(
    _user: AuthUser,
    query: web::Query<ListLoansQuery>,
    services: web::Data<Services>,
) -> HttpResponse {
    trace!("API: list loans {:?}", query);
    let page = query.page_or_default();
    let page_size = query.page_size_or_default();
    let result = services
        .loans
        .list_loans(&query.to_filter(), page, page_size)
        .await;
    paginated_response(result, page, page_size, Domain::Loan)
}

pub async fn create_loan(
    user: AuthUser,
    body: web::Json<CreateLoanRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    let result = services.loans.create_loan(body.into_inner()).await;
    if let Ok(created) = &result {
        info!(
            "API: {} created loan {}",
            user.name, created.loan.loan_id
        );
    }
    api_created(result, Domain::Loan)
}

pub async fn loan_stats(_user: AuthUser, services: web::Data<Services>) -> HttpResponse {
    api_result(services.loans.stats().await, Domain::Loan)
}

pub async fn get_loan(
    _user: AuthUser,
    path: web::Path<String>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(services.loans.get_loan(&path).await, Domain::Loan)
}

pub async fn edit_loan(
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateLoanRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    api_result(
        services.loans.edit_loan(&path, body.into_inner()).await,
        Domain::Loan,
    )
}

pub async fn update_loan_status(
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    let StatusUpdateRequest { status, force } = body.into_inner();
    info!(
        "API: {} sets loan {} to {} (force: {})",
        user.name, path, status, force
    );
    api_result(
        services.loans.update_status(&path, status, force).await,
        Domain::Loan,
    )
}

pub async fn bulk_close_loans(
    user: AuthUser,
    body: web::Json<BulkCloseRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    let BulkCloseRequest { loan_ids, force } = body.into_inner();

    let max_batch_size = get_config().api.max_batch_size;
    if loan_ids.len() > max_batch_size {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            ErrorCode::BatchSizeTooLarge,
            &format!("At most {} loans per request", max_batch_size),
        );
    }

    info!("API: {} bulk-closing {} loans", user.name, loan_ids.len());
    let result = services.loans.bulk_close(&loan_ids, force).await;
    success_response(result)
}

pub async fn loan_installments(
    _user: AuthUser,
    path: web::Path<String>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(
        services.installments.list_for_loan(&path).await,
        Domain::Loan,
    )
}

pub async fn loan_payments(
    _user: AuthUser,
    path: web::Path<String>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(services.payments.list_for_loan(&path).await, Domain::Loan)
}

pub async fn get_noc(
    _user: AuthUser,
    path: web::Path<String>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(services.nocs.get_noc(&path).await, Domain::Noc)
}

pub async fn issue_noc(
    user: AuthUser,
    path: web::Path<String>,
    body: Option<web::Json<IssueNocRequest>>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Manager) {
        return error_from_crm(&e, None);
    }
    let req = body.map(web::Json::into_inner).unwrap_or_default();
    api_created(
        services.nocs.issue_noc(&path, req, &user.name).await,
        Domain::Noc,
    )
}
