//! CLI 模式

use crate::cli::Commands;
use crate::interfaces::cli::CliError;

/// 对数据库执行一条已解析的命令
pub async fn run_cli(cmd: Commands) -> Result<(), CliError> {
    crate::interfaces::cli::run_cli_command(cmd).await
}
