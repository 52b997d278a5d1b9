//! 固定窗口限流器
//!
//! INCR 计数，窗口内第一次自增（计数恰好到 1）时设置 TTL。
//! 固定窗口的已知近似：跨窗口边界的突发最坏可达 2× limit，
//! 这是方案本身的取舍，不是需要修复的缺陷。

use std::sync::Arc;

use tracing::warn;

use crate::cache::StringCache;

pub struct RateLimiter {
    cache: Arc<dyn StringCache>,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn StringCache>) -> Self {
        Self { cache }
    }

    /// 同 key 的并发调用在缓存后端的单 key 原子性下安全：
    /// 只有把计数带到恰好 1 的那次调用负责设置 TTL，窗口不会
    /// 因并发首请求而丢失过期。
    pub async fn allow(&self, key: &str, limit: u32, window_secs: u64) -> bool {
        let count = match self.cache.incr(key).await {
            Ok(count) => count,
            Err(e) => {
                // 缓存不可用时放行：限流是保护措施，不应成为单点
                warn!("Rate limiter cache unavailable, failing open: {}", e);
                return true;
            }
        };

        if count == 1 {
            if let Err(e) = self.cache.expire(key, window_secs).await {
                warn!("Failed to arm rate limit window for '{}': {}", key, e);
            }
        }

        count <= i64::from(limit)
    }
}
