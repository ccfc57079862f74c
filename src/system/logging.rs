//! 日志初始化
//!
//! 根据 `[logging]` 构建全局 tracing subscriber：默认输出到控制台，
//! 也可写入追加文件或按天轮转的文件

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;

const DEFAULT_LOG_NAME: &str = "loancrm.log";

fn build_writer(config: &LoggingConfig) -> Result<Box<dyn std::io::Write + Send + Sync>> {
    let log_file = match config.file.as_deref() {
        Some(f) if !f.is_empty() => f,
        _ => return Ok(Box::new(std::io::stdout())),
    };

    if config.enable_rotation {
        let path = Path::new(log_file);
        let dir = path.parent().unwrap_or(Path::new("."));
        let filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_NAME);
        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(filename.trim_end_matches(".log"))
            .filename_suffix("log")
            .max_log_files(config.max_backups.max(1) as usize)
            .build(dir)
            .with_context(|| format!("Failed to create rolling log appender in {:?}", dir))?;
        Ok(Box::new(appender))
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("Failed to open log file {}", log_file))?;
        Ok(Box::new(file))
    }
}

/// 安装全局 subscriber
///
/// 在配置加载后调用一次。返回的 guard 在 drop 时刷新缓冲日志，
/// 必须保持到进程退出
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let writer = build_writer(config)?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);

    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level filter '{}'", config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(config.file.as_ref().is_none_or(|f| f.is_empty()));

    let installed = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(file: Option<String>, enable_rotation: bool) -> LoggingConfig {
        LoggingConfig {
            level: "info".to_string(),
            format: "text".to_string(),
            file,
            max_backups: 3,
            enable_rotation,
        }
    }

    #[test]
    fn test_plain_file_writer_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crm.log");
        let config = logging(Some(path.to_string_lossy().to_string()), false);
        assert!(build_writer(&config).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_empty_file_name_falls_back_to_console() {
        assert!(build_writer(&logging(Some(String::new()), true)).is_ok());
        assert!(build_writer(&logging(None, false)).is_ok());
    }
}
