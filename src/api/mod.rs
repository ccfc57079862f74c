//! HTTP 层：JWT 认证、中间件与路由处理器

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod services;
