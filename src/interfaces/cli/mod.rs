//! CLI 接口模块
//!
//! 命令直接操作数据库，无需启动服务器

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands, UserCommands};
use crate::errors::CrmError;
use crate::runtime::lifetime::startup::build_services;
use commands::{
    add_user, config_generate, export_leads, export_loans, import_leads, import_loans, list_users,
    sweep_overdue,
};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// 格式化为简单输出
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// 格式化为彩色输出
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<CrmError> for CliError {
    fn from(err: CrmError) -> Self {
        match err {
            CrmError::CsvParse(_) | CrmError::DateParse(_) => {
                CliError::ParseError(err.message().to_string())
            }
            CrmError::DatabaseConfig(_)
            | CrmError::DatabaseConnection(_)
            | CrmError::DatabaseOperation(_) => CliError::StorageError(err.message().to_string()),
            other => CliError::CommandError(other.format_simple()),
        }
    }
}

/// 执行 clap 解析后的 CLI 命令
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // 生成配置不需要数据库
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force).await;
    }

    if let Commands::Serve = cmd {
        return Err(CliError::CommandError(
            "`serve` is dispatched by the entry point, not the CLI runner".to_string(),
        ));
    }

    let (_storage, services) = build_services()
        .await
        .map_err(|e| CliError::StorageError(format!("{:#}", e)))?;

    match cmd {
        Commands::User { action } => match action {
            UserCommands::Add {
                email,
                name,
                role,
                password,
                stdin,
            } => add_user(&services, email, name, role, password, stdin).await,
            UserCommands::List => list_users(&services).await,
        },

        Commands::ImportLoans { file_path, mode } => {
            import_loans(&services, file_path, mode).await
        }

        Commands::ImportLeads { file_path, mode } => {
            import_leads(&services, file_path, mode).await
        }

        Commands::ExportLoans { file_path } => export_loans(&services, file_path).await,

        Commands::ExportLeads { file_path } => export_leads(&services, file_path).await,

        Commands::SweepOverdue { as_of } => sweep_overdue(&services, as_of).await,

        Commands::Serve | Commands::Config { .. } => unreachable!("handled above"),
    }
}
