//! CSV 导入导出命令

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::{ImportMode, ImportResult, Services};
use crate::storage::{LeadFilter, LoanFilter};
use crate::utils::csv_handler::{
    generate_export_filename, read_lead_rows, read_loan_rows, write_leads, write_loans,
};

fn open_input(file_path: &str) -> Result<BufReader<File>, CliError> {
    if !Path::new(file_path).exists() {
        return Err(CliError::CommandError(format!(
            "Import file not found: {}",
            file_path
        )));
    }
    let file = File::open(file_path).map_err(|e| {
        CliError::CommandError(format!("Failed to open import file '{}': {}", file_path, e))
    })?;
    Ok(BufReader::new(file))
}

fn create_output(file_path: &str) -> Result<BufWriter<File>, CliError> {
    let file = File::create(file_path).map_err(|e| {
        CliError::CommandError(format!(
            "Failed to create export file '{}': {}",
            file_path, e
        ))
    })?;
    Ok(BufWriter::new(file))
}

fn print_import_summary(kind: &str, result: &ImportResult) {
    println!(
        "{} Imported {} {}: {} new/updated, {} skipped, {} failed",
        "✓".green().bold(),
        result.total_rows,
        kind,
        result.success_count.to_string().green(),
        result.skipped_count.to_string().yellow(),
        result.failed_count.to_string().red()
    );
    for failure in &result.failed_items {
        println!(
            "  {} row {} ({}): {}",
            "✗".red(),
            failure.row,
            failure.key.cyan(),
            failure.error
        );
    }
}

pub async fn import_loans(
    services: &Services,
    file_path: String,
    mode: ImportMode,
) -> Result<(), CliError> {
    let rows = read_loan_rows(open_input(&file_path)?)?;
    println!(
        "{} {} rows from {} (mode: {})",
        "Importing".yellow(),
        rows.len(),
        file_path.blue(),
        mode
    );
    let result = services.loans.import_loans(rows, mode).await;
    print_import_summary("loans", &result);
    Ok(())
}

pub async fn import_leads(
    services: &Services,
    file_path: String,
    mode: ImportMode,
) -> Result<(), CliError> {
    let rows = read_lead_rows(open_input(&file_path)?)?;
    println!(
        "{} {} rows from {} (mode: {})",
        "Importing".yellow(),
        rows.len(),
        file_path.blue(),
        mode
    );
    let result = services.leads.import_leads(rows, mode).await;
    print_import_summary("leads", &result);
    Ok(())
}

pub async fn export_loans(services: &Services, file_path: Option<String>) -> Result<(), CliError> {
    let loans = services.loans.export_loans(&LoanFilter::default()).await?;
    if loans.is_empty() {
        println!("{} No loans to export", "ℹ".bold().blue());
        return Ok(());
    }

    let output_path = file_path.unwrap_or_else(|| generate_export_filename("loans"));
    write_loans(create_output(&output_path)?, &loans)?;
    println!(
        "{} Exported {} loans to {}",
        "✓".green().bold(),
        loans.len(),
        output_path.blue()
    );
    Ok(())
}

pub async fn export_leads(services: &Services, file_path: Option<String>) -> Result<(), CliError> {
    let leads = services.leads.export_leads(&LeadFilter::default()).await?;
    if leads.is_empty() {
        println!("{} No leads to export", "ℹ".bold().blue());
        return Ok(());
    }

    let output_path = file_path.unwrap_or_else(|| generate_export_filename("leads"));
    write_leads(create_output(&output_path)?, &leads)?;
    println!(
        "{} Exported {} leads to {}",
        "✓".green().bold(),
        leads.len(),
        output_path.blue()
    );
    Ok(())
}
