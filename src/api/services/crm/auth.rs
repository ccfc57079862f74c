//! 登录与当前用户

use actix_web::{HttpResponse, Responder, web};
use tracing::{error, info};

use crate::api::jwt::JwtService;
use crate::api::middleware::AuthUser;
use crate::errors::CrmError;
use crate::services::Services;

use super::error_code::Domain;
use super::helpers::{api_result, error_from_crm, success_response};
use super::types::{LoginRequest, LoginResponse};

pub async fn login(
    body: web::Json<LoginRequest>,
    services: web::Data<Services>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    let LoginRequest { email, password } = body.into_inner();
    let user = match services.users.authenticate(&email, &password).await {
        Ok(user) => user,
        Err(e) => return error_from_crm(&e, None),
    };

    match jwt.issue_token(&user) {
        Ok((token, expires_at)) => {
            info!("API: issued token for user {}", user.user_id);
            success_response(LoginResponse {
                token,
                token_type: "Bearer".to_string(),
                expires_at,
                user,
            })
        }
        Err(e) => {
            error!("Failed to sign token: {}", e);
            error_from_crm(
                &CrmError::database_operation("Failed to issue token"),
                None,
            )
        }
    }
}

/// 查询 Token 对应用户的最新账号信息
pub async fn me(user: AuthUser, services: web::Data<Services>) -> HttpResponse {
    api_result(services.users.get_user(user.user_id).await, Domain::User)
}
