//! 批量结清和 CSV 导入共用的逐行结果类型

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use ts_rs::TS;

use crate::api::services::crm::TS_EXPORT_PATH;

/// 导入行的键已存在时的处理方式
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImportMode {
    #[default]
    Skip,
    Overwrite,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ImportFailure {
    /// 数据行号，从 1 开始，不含表头
    pub row: usize,
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ImportResult {
    pub total_rows: usize,
    pub success_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub failed_items: Vec<ImportFailure>,
}

impl ImportResult {
    pub fn fail(&mut self, row: usize, key: impl Into<String>, error: impl ToString) {
        self.failed_count += 1;
        self.failed_items.push(ImportFailure {
            row,
            key: key.into(),
            error: error.to_string(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BatchFailedItem {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BatchResult {
    pub success: Vec<String>,
    pub failed: Vec<BatchFailedItem>,
}
