//! CRM HTTP API
//!
//! 处理器只做三件事：检查调用者角色、调用对应服务、
//! 将结果包装为 `{code, message, data}` 格式

mod auth;
mod clients;
pub mod error_code;
mod export_import;
pub mod helpers;
mod installments;
mod leads;
mod loans;
mod payments;
pub mod routes;
pub mod types;
mod users;

pub use error_code::{Domain, ErrorCode};
pub use helpers::{json_config, query_config};
pub use routes::crm_routes;
pub use types::{ApiResponse, PaginatedResponse, PaginationInfo, TS_EXPORT_PATH};
