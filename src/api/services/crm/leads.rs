//! 线索接口

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::api::middleware::AuthUser;
use crate::services::{ConvertLeadRequest, CreateLeadRequest, Services, UpdateLeadRequest};

use super::error_code::Domain;
use super::helpers::{api_created, api_result, paginated_response};
use super::types::{ConvertLeadResponse, ListLeadsQuery, Paged};

pub async fn list_leads(
    _user: AuthUser,
    query: web::Query<ListLeadsQuery>,
    services: web::Data<Services>,
) -> HttpResponse {
    let page = query.page_or_default();
    let page_size = query.page_size_or_default();
    let result = services
        .leads
        .list_leads(&query.to_filter(), page, page_size)
        .await;
    paginated_response(result, page, page_size, Domain::Lead)
}

pub async fn create_lead(
    _user: AuthUser,
    body: web::Json<CreateLeadRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_created(
        services.leads.create_lead(body.into_inner()).await,
        Domain::Lead,
    )
}

pub async fn get_lead(
    _user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(services.leads.get_lead(path.into_inner()).await, Domain::Lead)
}

pub async fn update_lead(
    _user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<UpdateLeadRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(
        services
            .leads
            .update_lead(path.into_inner(), body.into_inner())
            .await,
        Domain::Lead,
    )
}

pub async fn convert_lead(
    user: AuthUser,
    path: web::Path<i64>,
    body: Option<web::Json<ConvertLeadRequest>>,
    services: web::Data<Services>,
) -> HttpResponse {
    let lead_id = path.into_inner();
    let req = body.map(web::Json::into_inner).unwrap_or_default();
    let result = services
        .leads
        .convert_lead(lead_id, req)
        .await
        .map(|(lead, client)| {
            info!(
                "API: {} converted lead {} into client {}",
                user.name, lead.lead_id, client.client_id
            );
            ConvertLeadResponse { lead, client }
        });
    api_created(result, Domain::Lead)
}
