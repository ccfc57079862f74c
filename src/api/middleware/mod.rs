pub mod auth;
pub mod request_id;

pub use auth::{AuthUser, CrmAuth, require_role};
pub use request_id::{RequestId, RequestIdMiddleware};
