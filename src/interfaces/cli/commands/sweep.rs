//! `sweep-overdue`

use chrono::Utc;
use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::Services;
use crate::utils::csv_handler::parse_date;

pub async fn sweep_overdue(services: &Services, as_of: Option<String>) -> Result<(), CliError> {
    let today = match as_of {
        Some(raw) => parse_date(&raw)?,
        None => Utc::now().date_naive(),
    };

    let marked = services.installments.mark_overdue(today).await?;
    println!(
        "{} {} installments due before {} marked overdue",
        "✓".green().bold(),
        marked.to_string().yellow(),
        today.to_string().blue()
    );
    Ok(())
}
