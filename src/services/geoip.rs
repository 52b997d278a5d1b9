//! 外部 GeoIP API 查询
//!
//! 使用外部 HTTP API（如 ip-api.com）做 IP → 国家解析，
//! 内置 moka 缓存（含负缓存）避免重复查询。

use std::sync::OnceLock;
use std::time::Duration;

use moka::future::Cache;
use tracing::{trace, warn};
use ureq::Agent;

/// GeoIP 缓存 TTL（15 分钟）
const GEOIP_CACHE_TTL_SECS: u64 = 15 * 60;
/// GeoIP 缓存最大容量
const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;
/// HTTP 请求超时时间
const HTTP_TIMEOUT_SECS: u64 = 2;

/// 全局 HTTP Agent（ureq 的 Agent 是 Send + Sync）
static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

pub struct GeoIpProvider {
    /// `{ip}` 为占位符，例如 `http://ip-api.com/json/{ip}?fields=status,countryCode`
    api_url_template: String,
    /// IP → 国家缓存（Option 用于负缓存）
    cache: Cache<String, Option<String>>,
}

impl GeoIpProvider {
    pub fn new(api_url_template: &str) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(GEOIP_CACHE_TTL_SECS))
            .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
            .build();

        Self {
            api_url_template: api_url_template.to_string(),
            cache,
        }
    }

    /// 查询 IP 对应的国家代码，失败返回 None
    pub async fn lookup(&self, ip: &str) -> Option<String> {
        let url = self.api_url_template.replace("{ip}", ip);

        self.cache
            .get_with(ip.to_string(), async move {
                tokio::task::spawn_blocking(move || Self::fetch_from_api_sync(url))
                    .await
                    .unwrap_or(None)
            })
            .await
    }

    /// 从外部 API 获取国家代码（同步，在 spawn_blocking 中调用）
    fn fetch_from_api_sync(url: String) -> Option<String> {
        let agent = get_agent();

        let resp = match agent.get(&url).call() {
            Ok(r) => r,
            Err(e) => {
                warn!("GeoIP API request to \"{}\" failed: {}", url, e);
                return None;
            }
        };

        let json: serde_json::Value = match resp.into_body().read_json() {
            Ok(j) => j,
            Err(e) => {
                warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
                return None;
            }
        };

        if json["status"].as_str() == Some("fail") {
            trace!("GeoIP API returned fail status");
            return None;
        }

        json["countryCode"]
            .as_str()
            .or_else(|| json["country_code"].as_str())
            .or_else(|| json["country"].as_str())
            .map(String::from)
    }
}
