//! 运行模式路由
//!
//! 无参数时启动 HTTP 服务器，有参数时交给 CLI 处理

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "server")]
pub use server::run_server;

#[cfg(feature = "cli")]
pub use cli::run_cli;

/// 模式检测结果
#[derive(Debug, PartialEq)]
pub enum Mode {
    #[cfg(feature = "server")]
    Server,
    #[cfg(feature = "cli")]
    Cli,
    Unknown,
}

/// 根据原始进程参数选择运行模式
pub fn detect_mode(args: &[String]) -> Mode {
    #[cfg(feature = "cli")]
    if args.len() > 1 {
        return Mode::Cli;
    }

    #[cfg(feature = "server")]
    return Mode::Server;

    #[cfg(not(feature = "server"))]
    Mode::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    #[cfg(feature = "server")]
    fn test_no_arguments_runs_server() {
        assert_eq!(detect_mode(&args(&["loancrm"])), Mode::Server);
    }

    #[test]
    #[cfg(feature = "cli")]
    fn test_arguments_run_cli() {
        assert_eq!(detect_mode(&args(&["loancrm", "serve"])), Mode::Cli);
        assert_eq!(detect_mode(&args(&["loancrm", "--help"])), Mode::Cli);
    }
}
