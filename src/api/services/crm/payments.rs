//! 还款接口

use actix_web::{HttpResponse, web};

use crate::api::middleware::AuthUser;
use crate::services::{RecordPaymentRequest, Services};

use super::error_code::Domain;
use super::helpers::{api_created, api_result, paginated_response};
use super::types::{ListPaymentsQuery, Paged};

pub async fn list_payments(
    _user: AuthUser,
    query: web::Query<ListPaymentsQuery>,
    services: web::Data<Services>,
) -> HttpResponse {
    let page = query.page_or_default();
    let page_size = query.page_size_or_default();
    let result = services
        .payments
        .list_payments(&query.to_filter(), page, page_size)
        .await;
    paginated_response(result, page, page_size, Domain::Payment)
}

/// 任何已登录用户都可以记录还款
pub async fn record_payment(
    user: AuthUser,
    body: web::Json<RecordPaymentRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_created(
        services
            .payments
            .record_payment(body.into_inner(), &user.name)
            .await,
        Domain::Payment,
    )
}

pub async fn get_payment(
    _user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(
        services.payments.get_payment(path.into_inner()).await,
        Domain::Payment,
    )
}
