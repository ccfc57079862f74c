//! loan-crm - 贷款 CRM 后端
//!
//! 提供按周 EMI 还款计划的贷款、还款、线索、客户、用户和 NOC 签发，
//! 通过 JSON HTTP API 对外服务，另有用于管理的 CLI
//!
//! # 功能特性
//! - **server**: HTTP 服务器模式（默认）
//! - **cli**: 命令行接口（默认）
//!
//! # 架构
//! - `storage`: sea-orm 持久化与领域模型
//! - `services`: 业务规则（还款计划、还款、线索转化）
//! - `api`: HTTP 处理器、JWT 认证与中间件
//! - `interfaces`: CLI 命令
//! - `config`: 静态配置
//! - `runtime`: 启动、关闭与模式选择
//! - `system`: 日志

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
