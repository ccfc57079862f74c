//! 硬编码的 API 常量

pub const AUTHORIZATION_HEADER: &str = "Authorization";

pub const BEARER_PREFIX: &str = "Bearer ";

/// API 前缀下的登录路由，唯一无需认证的 CRM 路由
pub const LOGIN_PATH: &str = "/auth/login";

pub const REQUEST_ID_HEADER: &str = "x-request-id";
