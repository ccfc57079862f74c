//! CLI 命令实现

mod config_gen;
mod import_export;
mod sweep;
mod user;

pub use config_gen::*;
pub use import_export::*;
pub use sweep::*;
pub use user::*;
