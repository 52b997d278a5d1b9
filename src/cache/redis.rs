use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::cache::StringCache;
use crate::errors::{Result, ShortifyError};

pub struct RedisCache {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisCache {
    pub fn new(redis_url: &str, key_prefix: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| ShortifyError::cache_connection(format!("Invalid Redis URL: {}", e)))?;

        // 启动时同步 PING 一次，尽早暴露配置错误
        let mut conn = client.get_connection().map_err(|e| {
            ShortifyError::cache_connection(format!("Redis connection failed: {}", e))
        })?;
        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(|e| ShortifyError::cache_connection(format!("Redis ping failed: {}", e)))?;

        debug!("RedisCache created with prefix: '{}'", key_prefix);

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: key_prefix.to_string(),
        })
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        // 首先尝试读取现有连接
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn conn(&self) -> Result<MultiplexedConnection> {
        match self.get_connection().await {
            Ok(c) => Ok(c),
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl StringCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let redis_key = self.make_key(key);
        let mut conn = self.conn().await?;

        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let redis_key = self.make_key(key);
        let mut conn = self.conn().await?;

        match conn
            .set_ex::<_, _, ()>(&redis_key, value, ttl_secs)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to set key '{}': {}", key, e);
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let redis_key = self.make_key(key);
        let mut conn = self.conn().await?;

        match conn.incr::<_, _, i64>(&redis_key, 1i64).await {
            Ok(count) => Ok(count),
            Err(e) => {
                error!("Failed to incr key '{}': {}", key, e);
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        let redis_key = self.make_key(key);
        let mut conn = self.conn().await?;

        match conn.expire::<_, ()>(&redis_key, ttl_secs as i64).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to expire key '{}': {}", key, e);
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }
}
