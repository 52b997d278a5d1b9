//! 应用配置
//!
//! 配置来源优先级：环境变量（`SHORTIFY_` 前缀）> 配置文件（TOML）> 默认值。
//! 所有字段均有默认值，空配置也能启动（sqlite + 内存缓存）。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// 短链接的对外基础地址，用于拼接 short_url 响应字段
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 缓存后端："redis" 或 "memory"
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// 缓存条目 TTL（秒），同时作为黑名单负缓存的过期时间
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// 固定窗口内允许的创建次数
    #[serde(default = "default_rate_limit")]
    pub create_limit: u32,
    /// 窗口长度（秒）
    #[serde(default = "default_rate_window")]
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// 地址哈希盐值，部署时必须覆盖默认值
    #[serde(default = "default_ip_salt")]
    pub ip_salt: String,
    /// GeoIP 查询 API 模板，`{ip}` 为占位符；为空则跳过地理位置解析
    #[serde(default)]
    pub geoip_api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 管理端点令牌，为空则禁用 /analytics/admin
    #[serde(default)]
    pub admin_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 日志文件路径，为空输出到控制台
    #[serde(default)]
    pub file: String,
    /// "json" 或 "plain"
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_database_url() -> String {
    "sqlite://shortify.db?mode=rwc".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_cache_backend() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_key_prefix() -> String {
    "shortify:".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_rate_limit() -> u32 {
    10
}

fn default_rate_window() -> u64 {
    60
}

fn default_ip_salt() -> String {
    "shortify-dev-salt".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            base_url: default_base_url(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            pool_size: default_pool_size(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            default_ttl: default_cache_ttl(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            create_limit: default_rate_limit(),
            window_secs: default_rate_window(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            ip_salt: default_ip_salt(),
            geoip_api_url: String::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_token: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// 加载配置：可选的 `SHORTIFY_CONFIG` 指定的 TOML 文件 + 环境变量覆盖
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var("SHORTIFY_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        }

        builder
            .add_source(
                config::Environment::with_prefix("SHORTIFY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
