//! 客户接口

use actix_web::{HttpResponse, web};

use crate::api::middleware::AuthUser;
use crate::services::{CreateClientRequest, Services, UpdateClientRequest};

use super::error_code::Domain;
use super::helpers::{api_created, api_result, paginated_response};
use super::types::{ListClientsQuery, Paged};

pub async fn list_clients(
    _user: AuthUser,
    query: web::Query<ListClientsQuery>,
    services: web::Data<Services>,
) -> HttpResponse {
    let page = query.page_or_default();
    let page_size = query.page_size_or_default();
    let result = services
        .clients
        .list_clients(&query.to_filter(), page, page_size)
        .await;
    paginated_response(result, page, page_size, Domain::Client)
}

pub async fn create_client(
    _user: AuthUser,
    body: web::Json<CreateClientRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_created(
        services.clients.create_client(body.into_inner()).await,
        Domain::Client,
    )
}

pub async fn get_client(
    _user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(
        services.clients.get_client(path.into_inner()).await,
        Domain::Client,
    )
}

pub async fn update_client(
    _user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<UpdateClientRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    api_result(
        services
            .clients
            .update_client(path.into_inner(), body.into_inner())
            .await,
        Domain::Client,
    )
}
