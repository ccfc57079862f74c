use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::schedule::RoundingPolicy;
use crate::utils::money::MONEY_DP;

/// 应用配置
///
/// 配置来源（后者覆盖前者）：
/// 1. 内置默认值
/// 2. 工作目录下的 `config.toml`（可选）
/// 3. 环境变量 `CRM__<SECTION>__<KEY>`，例如 `CRM__SERVER__PORT=4000`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub loans: LoansConfig,
    #[serde(default)]
    pub installments: InstallmentsConfig,
}

impl StaticConfig {
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("CRM")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if let Err(e) = config.validate() {
                        eprintln!("[ERROR] Invalid configuration: {}", e);
                        return Self::default();
                    }
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// serde 默认值无法表达的跨字段校验
    pub fn validate(&self) -> Result<(), String> {
        self.loans.validate()
    }

    /// 生成所有键均为默认值的示例 TOML
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("# Error generating sample config: {}", e))
    }

    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 连接/获取超时（秒）
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" 或 "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 签名密钥，为空时每个进程随机生成
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,
    /// 用户表为空时在启动阶段创建
    #[serde(default)]
    pub bootstrap_admin_email: Option<String>,
    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,
    #[serde(default = "default_bootstrap_admin_name")]
    pub bootstrap_admin_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_prefix")]
    pub prefix: String,
    #[serde(default = "default_max_import_file_size")]
    pub max_import_file_size: usize,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_payload_limit")]
    pub payload_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_cors_enabled")]
    pub enabled: bool,
    /// `["*"]` 允许任意来源
    #[serde(default = "default_cors_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

/// 贷款策略配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoansConfig {
    #[serde(default = "default_installments")]
    pub default_installments: u32,
    #[serde(default = "default_interval_days")]
    pub installment_interval_days: u32,
    /// 每期金额保留的小数位（0 表示整卢比）
    #[serde(default)]
    pub rounding_dp: u32,
    #[serde(default)]
    pub rounding_policy: RoundingPolicy,
    #[serde(default = "default_gst_rate_percent")]
    pub gst_rate_percent: Decimal,
    /// 存在未还分期时拒绝结清贷款
    #[serde(default = "default_true")]
    pub strict_close: bool,
    /// 允许经理通过 `force = true` 绕过 `strict_close`
    #[serde(default = "default_true")]
    pub allow_force_close: bool,
}

impl LoansConfig {
    /// 分期金额以派萨存储，最多两位小数
    pub fn validate(&self) -> Result<(), String> {
        if self.rounding_dp > MONEY_DP {
            return Err(format!(
                "loans.rounding_dp must be at most {}, got {}",
                MONEY_DP, self.rounding_dp
            ));
        }
        if self.default_installments == 0 {
            return Err("loans.default_installments must be at least 1".to_string());
        }
        if self.installment_interval_days == 0 {
            return Err("loans.installment_interval_days must be at least 1".to_string());
        }
        if self.gst_rate_percent < Decimal::ZERO
            || self.gst_rate_percent > Decimal::ONE_HUNDRED
        {
            return Err(format!(
                "loans.gst_rate_percent must be between 0 and 100, got {}",
                self.gst_rate_percent
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentsConfig {
    /// 为 0 时禁用后台逾期扫描
    #[serde(default = "default_overdue_sweep_interval_secs")]
    pub overdue_sweep_interval_secs: u64,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://loancrm.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    8
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_access_token_minutes() -> u64 {
    720
}

fn default_bootstrap_admin_name() -> String {
    "Administrator".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_max_import_file_size() -> usize {
    10 * 1024 * 1024
}

fn default_max_batch_size() -> usize {
    5000
}

fn default_payload_limit() -> usize {
    1024 * 1024
}

fn default_cors_enabled() -> bool {
    true
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec!["http://localhost:4000".to_string()]
}

fn default_cors_max_age() -> u64 {
    3600
}

fn default_installments() -> u32 {
    14
}

fn default_interval_days() -> u32 {
    7
}

fn default_gst_rate_percent() -> Decimal {
    Decimal::from(18)
}

fn default_true() -> bool {
    true
}

fn default_overdue_sweep_interval_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_minutes: default_access_token_minutes(),
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
            bootstrap_admin_name: default_bootstrap_admin_name(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: default_api_prefix(),
            max_import_file_size: default_max_import_file_size(),
            max_batch_size: default_max_batch_size(),
            payload_limit: default_payload_limit(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_cors_enabled(),
            allowed_origins: default_cors_allowed_origins(),
            max_age: default_cors_max_age(),
        }
    }
}

impl Default for LoansConfig {
    fn default() -> Self {
        Self {
            default_installments: default_installments(),
            installment_interval_days: default_interval_days(),
            rounding_dp: 0,
            rounding_policy: RoundingPolicy::default(),
            gst_rate_percent: default_gst_rate_percent(),
            strict_close: true,
            allow_force_close: true,
        }
    }
}

impl Default for InstallmentsConfig {
    fn default() -> Self {
        Self {
            overdue_sweep_interval_secs: default_overdue_sweep_interval_secs(),
        }
    }
}
