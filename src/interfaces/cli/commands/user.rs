//! `user add` / `user list`

use std::io::{self, BufRead, IsTerminal, Write};

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::{CreateUserRequest, Services};
use crate::storage::{UserFilter, UserRole};

/// 从 `--stdin`、`--password` 或交互式提示读取密码
fn get_password(password: Option<String>, stdin: bool) -> Result<String, CliError> {
    if stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CliError::CommandError(format!("Failed to read from stdin: {}", e)))?;
        Ok(line.trim().to_string())
    } else if let Some(pwd) = password {
        Ok(pwd)
    } else {
        prompt_password_with_confirm()
    }
}

fn prompt_password_with_confirm() -> Result<String, CliError> {
    if !io::stdin().is_terminal() {
        return Err(CliError::CommandError(
            "No password provided. Use --password or --stdin flag, or run interactively."
                .to_string(),
        ));
    }

    let read = |prompt: &str| -> Result<String, CliError> {
        print!("{}", prompt);
        io::stdout()
            .flush()
            .map_err(|e| CliError::CommandError(e.to_string()))?;
        rpassword::read_password()
            .map_err(|e| CliError::CommandError(format!("Failed to read password: {}", e)))
    };

    let password = read("Password: ")?;
    let confirm = read("Confirm password: ")?;
    if password != confirm {
        return Err(CliError::CommandError("Passwords do not match".to_string()));
    }
    Ok(password)
}

pub async fn add_user(
    services: &Services,
    email: String,
    name: String,
    role: UserRole,
    password: Option<String>,
    stdin: bool,
) -> Result<(), CliError> {
    let password = get_password(password, stdin)?;
    let user = services
        .users
        .create_user(CreateUserRequest {
            name,
            email,
            password,
            role,
        })
        .await?;

    println!(
        "{} Created {} {} ({})",
        "✓".green().bold(),
        user.role.to_string().cyan(),
        user.email.blue(),
        user.user_id
    );
    Ok(())
}

pub async fn list_users(services: &Services) -> Result<(), CliError> {
    let (users, total) = services
        .users
        .list_users(&UserFilter::default(), 1, 100)
        .await?;

    if users.is_empty() {
        println!("{} No users", "ℹ".bold().blue());
        return Ok(());
    }

    println!("{}", format!("Users ({} total):", total).bold().green());
    for user in users {
        println!(
            "  {:>4}  {}  {}  {}  {}",
            user.user_id,
            user.email.cyan(),
            user.name,
            user.role.to_string().yellow(),
            user.status.to_string().dimmed()
        );
    }
    if total > 100 {
        println!("  {}", "(first 100 shown)".dimmed());
    }
    Ok(())
}
