//! 域名黑名单守卫
//!
//! 旁路缓存 + 负缓存：命中与未命中都以标准 TTL 写回缓存，
//! 重复查询同一主机名不再访问数据库。黑名单更新后最多有一个
//! TTL 的陈旧窗口，调用方需容忍。

use std::sync::Arc;

use tracing::warn;
use url::Url;

use crate::cache::{StringCache, keys};
use crate::errors::Result;
use crate::storage::SeaOrmStorage;

pub struct BlacklistGuard {
    storage: Arc<SeaOrmStorage>,
    cache: Arc<dyn StringCache>,
    cache_ttl: u64,
}

impl BlacklistGuard {
    pub fn new(storage: Arc<SeaOrmStorage>, cache: Arc<dyn StringCache>, cache_ttl: u64) -> Self {
        Self {
            storage,
            cache,
            cache_ttl,
        }
    }

    /// 无法解析的 URL 返回 false（格式校验由归一化层负责，这里不重复报错）
    pub async fn is_blacklisted(&self, url: &str) -> Result<bool> {
        let Some(hostname) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        else {
            return Ok(false);
        };

        let key = keys::blacklist(&hostname);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => return Ok(cached == "1"),
            Ok(None) => {}
            Err(e) => {
                // 缓存故障降级为直查数据库
                warn!("Blacklist cache read failed, falling back to database: {}", e);
            }
        }

        let blocked = self.storage.is_domain_blacklisted(&hostname).await?;

        let value = if blocked { "1" } else { "0" };
        if let Err(e) = self.cache.set_ex(&key, value, self.cache_ttl).await {
            warn!("Failed to cache blacklist result for '{}': {}", hostname, e);
        }

        Ok(blocked)
    }
}
