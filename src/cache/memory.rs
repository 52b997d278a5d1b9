//! 进程内缓存后端
//!
//! 单进程部署和测试使用。TTL 语义与 Redis 后端对齐：
//! 过期条目在读取时惰性清除，计数器在过期后从 0 重新开始。

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::cache::StringCache;
use crate::errors::Result;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

#[derive(Default, Clone)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl StringCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();

        let value = match self.inner.get(key) {
            Some(entry) if !entry.expired(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => return Ok(None),
        };

        if value.is_none() {
            // 惰性清除过期条目；持有读引用时不能删除，先释放再 remove_if
            self.inner.remove_if(key, |_, entry| entry.expired(now));
        }

        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.inner.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let now = Instant::now();

        // entry API 持有分片锁，自增对同 key 并发调用是原子的
        let mut entry = self.inner.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });

        if entry.expired(now) {
            entry.value = "0".to_string();
            entry.expires_at = None;
        }

        let count = entry.value.parse::<i64>().unwrap_or(0) + 1;
        entry.value = count.to_string();

        Ok(count)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        if let Some(mut entry) = self.inner.get_mut(key) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_secs));
        }
        Ok(())
    }
}
