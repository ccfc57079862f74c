//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::services::ImportMode;
use crate::storage::UserRole;

/// loancrm - loan CRM backend
#[derive(Parser)]
#[command(name = "loancrm")]
#[command(version)]
#[command(about = "Loan CRM backend: loans, EMI schedules, collections and leads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (same as running without arguments)
    Serve,

    /// Manage CRM users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Import loans from a CSV file
    ImportLoans {
        /// Input file path
        file_path: String,

        /// Existing loan ids: skip, overwrite or error
        #[arg(long, default_value = "skip")]
        mode: ImportMode,
    },

    /// Import leads from a CSV file
    ImportLeads {
        /// Input file path
        file_path: String,

        /// Existing phone numbers: skip, overwrite or error
        #[arg(long, default_value = "skip")]
        mode: ImportMode,
    },

    /// Export loans to a CSV file
    ExportLoans {
        /// Output file path (default: timestamped name)
        file_path: Option<String>,
    },

    /// Export leads to a CSV file
    ExportLeads {
        /// Output file path (default: timestamped name)
        file_path: Option<String>,
    },

    /// Mark pending installments due before a date as overdue
    SweepOverdue {
        /// Reference date, YYYY-MM-DD (default: today)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// User management commands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user
    Add {
        /// Login email
        email: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Employee, Manager or Admin
        #[arg(long, default_value = "Employee")]
        role: UserRole,

        /// Password (if not provided, will prompt interactively)
        #[arg(long)]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// List users
    List,
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite without asking
        #[arg(long)]
        force: bool,
    },
}
