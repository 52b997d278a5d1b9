//! 点击事件记录
//!
//! 每次成功解析短码后调用一次，与重定向响应完全解耦：
//! dispatch 之后的一切失败都只记日志，绝不影响跳转。
//! 客户端地址先加盐做单向哈希再落库，原始地址不持久化。

use std::fmt::Write as _;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::errors::Result;
use crate::services::geoip::GeoIpProvider;
use crate::services::ua_parser::{is_probable_qr_scan, parse_user_agent};
use crate::storage::{NewClickEvent, SeaOrmStorage};
use crate::utils::ip::is_private_or_local;

/// 同步阶段从请求中提取的原始素材，分类计算都在后台任务里做
#[derive(Debug, Clone)]
pub struct ClickContext {
    pub code: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

pub struct ClickRecorder {
    storage: Arc<SeaOrmStorage>,
    geoip: Option<Arc<GeoIpProvider>>,
    ip_salt: String,
}

impl ClickRecorder {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        geoip: Option<Arc<GeoIpProvider>>,
        ip_salt: String,
    ) -> Self {
        Self {
            storage,
            geoip,
            ip_salt,
        }
    }

    /// fire-and-forget：后台任务执行，失败不向调用方传播
    pub fn dispatch(self: &Arc<Self>, ctx: ClickContext) {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = recorder.record(ctx).await {
                warn!("Click recording failed (non-blocking): {}", e);
            }
        });
    }

    pub async fn record(&self, ctx: ClickContext) -> Result<()> {
        let user_agent = ctx.user_agent.as_deref().unwrap_or("");
        let info = parse_user_agent(user_agent);
        let is_qr = is_probable_qr_scan(user_agent, ctx.referrer.as_deref());

        let country = self.resolve_country(ctx.client_ip.as_deref()).await;
        let address_hash = hash_address(ctx.client_ip.as_deref().unwrap_or(""), &self.ip_salt);

        self.storage
            .insert_click_event(NewClickEvent {
                short_code: ctx.code.clone(),
                address_hash,
                device: info.device.as_str().to_string(),
                browser: info.browser.to_string(),
                os: info.os.to_string(),
                country,
                is_qr,
                referrer: ctx.referrer.filter(|r| !r.is_empty()),
                clicked_at: Utc::now(),
            })
            .await?;

        self.storage.increment_click(&ctx.code).await?;

        Ok(())
    }

    async fn resolve_country(&self, client_ip: Option<&str>) -> String {
        let (Some(geoip), Some(ip)) = (&self.geoip, client_ip) else {
            return "Unknown".to_string();
        };

        // 私有/本地地址查不出有意义的结果，跳过
        let routable = ip
            .parse::<IpAddr>()
            .map(|addr| !is_private_or_local(&addr))
            .unwrap_or(false);
        if !routable {
            return "Unknown".to_string();
        }

        geoip
            .lookup(ip)
            .await
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// 单向地址哈希：hex(sha256(address + salt))
pub fn hash_address(address: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(address.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_salted() {
        let a = hash_address("203.0.113.7", "salt-1");
        let b = hash_address("203.0.113.7", "salt-1");
        let c = hash_address("203.0.113.7", "salt-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_does_not_leak_address() {
        let hashed = hash_address("203.0.113.7", "salt");
        assert!(!hashed.contains("203.0.113.7"));
    }
}
