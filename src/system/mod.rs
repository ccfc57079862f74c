//! 各运行模式共用的进程级基础设施

pub mod logging;

pub use logging::init_logging;
