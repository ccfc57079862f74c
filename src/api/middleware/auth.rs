use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::{Method, header::CONTENT_TYPE},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::api::constants;
use crate::api::jwt::{AccessClaims, JwtService};
use crate::api::services::crm::{ApiResponse, ErrorCode};
use crate::config::get_config;
use crate::errors::CrmError;
use crate::storage::UserRole;

/// 从 Bearer Token 解析出的当前用户
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub name: String,
    pub role: UserRole,
}

impl AuthUser {
    fn from_claims(claims: AccessClaims) -> Option<Self> {
        Some(Self {
            user_id: claims.sub.parse().ok()?,
            name: claims.name,
            role: claims.role,
        })
    }

    /// 角色有序，Manager 可以通过 Employee 级别的检查
    pub fn require(&self, min: UserRole) -> Result<(), CrmError> {
        require_role(self, min)
    }
}

pub fn require_role(user: &AuthUser, min: UserRole) -> Result<(), CrmError> {
    if user.role >= min {
        Ok(())
    } else {
        debug!(
            "User {} ({}) denied, {} required",
            user.user_id, user.role, min
        );
        Err(CrmError::forbidden(format!("{} role required", min)))
    }
}

impl FromRequest for AuthUser {
    type Error = CrmError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| CrmError::unauthorized("Authentication required")),
        )
    }
}

/// CRM 路由的 Bearer Token 认证
#[derive(Clone)]
pub struct CrmAuth;

impl<S, B> Transform<S, ServiceRequest> for CrmAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CrmAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let prefix = get_config().api.prefix.clone();
        ready(Ok(CrmAuthMiddleware {
            service: Rc::new(service),
            login_path: format!("{}{}", prefix, constants::LOGIN_PATH),
        }))
    }
}

pub struct CrmAuthMiddleware<S> {
    service: Rc<S>,
    login_path: String,
}

impl<S, B> CrmAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// 处理 CORS 预检的 OPTIONS 请求
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    fn handle_unauthorized(
        req: ServiceRequest,
        code: ErrorCode,
        message: &str,
    ) -> ServiceResponse<EitherBody<B>> {
        info!("Authentication failed for {}: {}", req.path(), message);
        req.into_response(
            HttpResponse::Unauthorized()
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(ApiResponse::<()> {
                    code: code as i32,
                    message: message.to_string(),
                    data: None,
                })
                .map_into_right_body(),
        )
    }

    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get(constants::AUTHORIZATION_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix(constants::BEARER_PREFIX))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl<S, B> Service<ServiceRequest> for CrmAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let login_path = self.login_path.clone();

        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            if req.path() == login_path {
                trace!("Login endpoint accessed - bypassing authentication");
                let response = srv.call(req).await?.map_into_left_body();
                return Ok(response);
            }

            let Some(token) = Self::extract_bearer_token(&req) else {
                return Ok(Self::handle_unauthorized(
                    req,
                    ErrorCode::Unauthorized,
                    "Missing bearer token",
                ));
            };

            let Some(jwt) = req.app_data::<web::Data<JwtService>>().cloned() else {
                tracing::error!("JwtService is not registered as app data");
                return Ok(Self::handle_unauthorized(
                    req,
                    ErrorCode::Unauthorized,
                    "Authentication unavailable",
                ));
            };

            let claims = match jwt.validate_access_token(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    let code = match e.kind() {
                        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                            ErrorCode::TokenExpired
                        }
                        _ => ErrorCode::TokenInvalid,
                    };
                    return Ok(Self::handle_unauthorized(
                        req,
                        code,
                        "Invalid or expired token",
                    ));
                }
            };

            let Some(user) = AuthUser::from_claims(claims) else {
                return Ok(Self::handle_unauthorized(
                    req,
                    ErrorCode::TokenInvalid,
                    "Invalid or expired token",
                ));
            };

            trace!("Authenticated user {} ({})", user.user_id, user.role);
            req.extensions_mut().insert(user);
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
