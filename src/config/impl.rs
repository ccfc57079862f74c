use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

fn cell() -> &'static ArcSwap<StaticConfig> {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()))
}

/// 获取全局配置实例
///
/// 如果 `init_config()` 尚未调用，首次访问时加载 `config.toml`
/// 和 `CRM__*` 环境变量
pub fn get_config() -> Arc<StaticConfig> {
    cell().load_full()
}

/// 初始化全局配置
///
/// # 示例
/// ```no_run
/// use loan_crm::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    let _ = cell();
}

/// 替换为新配置（CLI 覆盖参数、测试）
pub fn replace_config(config: StaticConfig) {
    cell().store(Arc::new(config));
}
