//! 缓存层
//!
//! 单实例共享缓存，承载三类状态：
//! - code→URL / URL→code 的旁路缓存（cache-aside，TTL 过期，可随时重建）
//! - 限流计数器（固定窗口，TTL 即窗口）
//! - 黑名单查询的正/负缓存
//!
//! 所有值均为字符串，单 key 操作由后端保证原子性，不依赖多 key 事务。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::CacheConfig;
use crate::errors::{Result, ShortifyError};

mod memory;
mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

/// 缓存 key 模式
///
/// 集中定义，避免各组件拼 key 时各自为政。
pub mod keys {
    /// 命中计数器（单调递增，无 TTL）
    pub const CACHE_HITS: &str = "cache:hits";
    /// 未命中计数器
    pub const CACHE_MISSES: &str = "cache:misses";

    pub fn short(code: &str) -> String {
        format!("short:{}", code)
    }

    pub fn long(normalized_url: &str) -> String {
        format!("long:{}", normalized_url)
    }

    pub fn blacklist(hostname: &str) -> String {
        format!("bl:{}", hostname)
    }

    pub fn rate_create(client_ip: &str) -> String {
        format!("rl:create:{}", client_ip)
    }
}

#[async_trait]
pub trait StringCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 写入并设置 TTL（秒）
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// 计数器自增，返回自增后的值；key 不存在时从 0 开始
    async fn incr(&self, key: &str) -> Result<i64>;

    /// 为已存在的 key 设置过期时间
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()>;
}

/// 按配置构建缓存后端
pub fn build_cache(config: &CacheConfig) -> Result<Arc<dyn StringCache>> {
    match config.backend.as_str() {
        "redis" => {
            let cache = RedisCache::new(&config.redis_url, &config.key_prefix)?;
            info!("Cache backend: redis ({})", config.redis_url);
            Ok(Arc::new(cache))
        }
        "memory" => {
            info!("Cache backend: in-process memory");
            Ok(Arc::new(MemoryCache::new()))
        }
        other => Err(ShortifyError::cache_connection(format!(
            "Unknown cache backend: {}",
            other
        ))),
    }
}
