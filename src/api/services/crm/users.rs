//! 用户管理（仅 Admin）

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::api::middleware::AuthUser;
use crate::services::{CreateUserRequest, Services, UpdateUserRequest};
use crate::storage::UserRole;

use super::error_code::Domain;
use super::helpers::{api_created, api_result, error_from_crm, paginated_response};
use super::types::{ListUsersQuery, Paged};

pub async fn list_users(
    user: AuthUser,
    query: web::Query<ListUsersQuery>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Admin) {
        return error_from_crm(&e, None);
    }
    let page = query.page_or_default();
    let page_size = query.page_size_or_default();
    let result = services
        .users
        .list_users(&query.to_filter(), page, page_size)
        .await;
    paginated_response(result, page, page_size, Domain::User)
}

pub async fn create_user(
    user: AuthUser,
    body: web::Json<CreateUserRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Admin) {
        return error_from_crm(&e, None);
    }
    let result = services.users.create_user(body.into_inner()).await;
    if let Ok(created) = &result {
        info!("API: {} created user {}", user.name, created.email);
    }
    api_created(result, Domain::User)
}

pub async fn get_user(
    user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Admin) {
        return error_from_crm(&e, None);
    }
    api_result(services.users.get_user(path.into_inner()).await, Domain::User)
}

pub async fn update_user(
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<UpdateUserRequest>,
    services: web::Data<Services>,
) -> HttpResponse {
    if let Err(e) = user.require(UserRole::Admin) {
        return error_from_crm(&e, None);
    }
    api_result(
        services
            .users
            .update_user(path.into_inner(), body.into_inner())
            .await,
        Domain::User,
    )
}
