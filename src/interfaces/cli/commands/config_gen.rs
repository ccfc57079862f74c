//! `config generate`

use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;

use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;

/// 写出所有键均为默认值的示例配置
pub async fn config_generate(output_path: Option<String>, force: bool) -> Result<(), CliError> {
    let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());

    if !force && Path::new(&path).exists() {
        print!(
            "{} {} {}",
            "File already exists:".yellow(),
            path.blue(),
            "Overwrite? [y/N] ".yellow()
        );
        io::stdout()
            .flush()
            .map_err(|e| CliError::CommandError(e.to_string()))?;

        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| CliError::CommandError(e.to_string()))?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Aborted.".red());
            return Ok(());
        }
    }

    println!(
        "{} {}",
        "Generating configuration file...".yellow(),
        path.blue()
    );

    StaticConfig::default().save_to_file(&path).map_err(|e| {
        CliError::CommandError(format!("Unable to write configuration file: {}", e))
    })?;

    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    println!(
        "  {}",
        "Set auth.jwt_secret and database.database_url before starting the server".yellow()
    );
    Ok(())
}
