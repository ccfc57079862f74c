use std::process::ExitCode;

use clap::Parser;

use loan_crm::cli::{Cli, Commands};
use loan_crm::config::{LoggingConfig, get_config, init_config};
use loan_crm::runtime::modes::{self, Mode};
use loan_crm::system::init_logging;

async fn serve() -> ExitCode {
    let config = get_config();
    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match modes::run_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server exited with error: {:#}", e);
            eprintln!("Server error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cmd: Commands) -> ExitCode {
    // 命令模式下只在控制台输出警告和错误，保持输出整洁
    let logging = LoggingConfig {
        level: "warn".to_string(),
        file: None,
        ..get_config().logging.clone()
    };
    let _guard = init_logging(&logging).ok();

    match modes::run_cli(cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            ExitCode::FAILURE
        }
    }
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_config();

    let args: Vec<String> = std::env::args().collect();
    match modes::detect_mode(&args) {
        Mode::Cli => match Cli::parse().command {
            None | Some(Commands::Serve) => serve().await,
            Some(cmd) => run_command(cmd).await,
        },
        Mode::Server => serve().await,
        Mode::Unknown => {
            eprintln!("No execution mode enabled; build with the `server` feature");
            ExitCode::FAILURE
        }
    }
}
