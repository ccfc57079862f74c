//! HTTP 之外的用户接口

#[cfg(feature = "cli")]
pub mod cli;
