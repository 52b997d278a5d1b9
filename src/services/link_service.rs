//! 链接解析服务
//!
//! 编排创建（shorten）与解析（resolve）：限流 → 归一化 → 黑名单 →
//! 短码分配 → 落库 → 缓存回填。缓存是派生状态，丢失安全；
//! 缓存未命中永远意味着需要查库，而不是不存在。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{StringCache, keys};
use crate::config::RateLimitConfig;
use crate::errors::{Result, ShortifyError};
use crate::services::blacklist::BlacklistGuard;
use crate::services::codegen::generate_code;
use crate::services::rate_limit::RateLimiter;
use crate::storage::SeaOrmStorage;
use crate::utils::{is_valid_alias, normalize_url};

/// 短码碰撞时的重新生成上限
const MAX_GENERATE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct ShortenRequest {
    pub long_url: String,
    pub alias: Option<String>,
    pub client_ip: String,
    pub owner: Option<String>,
}

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    cache: Arc<dyn StringCache>,
    rate_limiter: RateLimiter,
    blacklist: BlacklistGuard,
    cache_ttl: u64,
    rate_limit: RateLimitConfig,
}

impl LinkService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        cache: Arc<dyn StringCache>,
        cache_ttl: u64,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            rate_limiter: RateLimiter::new(Arc::clone(&cache)),
            blacklist: BlacklistGuard::new(Arc::clone(&storage), Arc::clone(&cache), cache_ttl),
            storage,
            cache,
            cache_ttl,
            rate_limit,
        }
    }

    /// 创建短链接，返回短码
    pub async fn shorten(&self, request: ShortenRequest) -> Result<String> {
        // 1. 限流门（按客户端 IP 的固定窗口）
        let rate_key = keys::rate_create(&request.client_ip);
        let allowed = self
            .rate_limiter
            .allow(
                &rate_key,
                self.rate_limit.create_limit,
                self.rate_limit.window_secs,
            )
            .await;
        if !allowed {
            return Err(ShortifyError::rate_limited("Rate limit exceeded"));
        }

        // 2. 归一化
        let long_url = normalize_url(&request.long_url)?;

        // 3. 黑名单门
        if self.blacklist.is_blacklisted(&long_url).await? {
            return Err(ShortifyError::blacklisted_domain(
                "This domain is blacklisted",
            ));
        }

        match request.alias {
            Some(alias) => {
                self.shorten_with_alias(&long_url, &alias, request.owner.as_deref())
                    .await
            }
            None => self.shorten_generated(&long_url, request.owner.as_deref()).await,
        }
    }

    /// 别名路径
    ///
    /// 只回填 short:{alias} 方向，不写 long: 方向：之后对同一 URL 的
    /// 非别名请求发现不了这个别名，会另铸一个独立短码。这是双向缓存
    /// 设计的已知结果，按现状保留。
    async fn shorten_with_alias(
        &self,
        long_url: &str,
        alias: &str,
        owner: Option<&str>,
    ) -> Result<String> {
        if !is_valid_alias(alias) {
            return Err(ShortifyError::validation(
                "Alias must be 3-50 characters of letters, digits, '-' or '_'",
            ));
        }

        // 进程内预检只是省一次必然失败的 INSERT；
        // 并发竞争最终由数据库唯一约束裁决
        if self.storage.find_by_code(alias).await?.is_some() {
            return Err(ShortifyError::alias_taken("Alias already taken"));
        }

        self.storage.insert_link(alias, long_url, owner).await?;
        self.populate_short(alias, long_url).await;

        Ok(alias.to_string())
    }

    /// 默认路径：旁路缓存 → 幂等复用已有映射 → 生成新码
    async fn shorten_generated(&self, long_url: &str, owner: Option<&str>) -> Result<String> {
        let long_key = keys::long(long_url);

        match self.cache.get(&long_key).await {
            Ok(Some(code)) => {
                self.track_cache(true).await;
                return Ok(code);
            }
            Ok(None) => self.track_cache(false).await,
            Err(e) => {
                warn!("Cache read failed during shorten, falling back to database: {}", e);
            }
        }

        if let Some(existing) = self.storage.find_by_long_url(long_url).await? {
            self.populate_both(&existing.short_code, long_url).await;
            return Ok(existing.short_code);
        }

        // 两个并发请求可能都走到这里并各自插入一行：接受这个竞态，
        // 两个短码都能正确解析，后写者的 long: 缓存生效
        for attempt in 0..MAX_GENERATE_ATTEMPTS {
            let code = generate_code(long_url, attempt);

            if self.storage.find_by_code(&code).await?.is_some() {
                debug!("Short code collision for '{}', regenerating", code);
                continue;
            }

            match self.storage.insert_link(&code, long_url, owner).await {
                Ok(_) => {
                    self.populate_both(&code, long_url).await;
                    return Ok(code);
                }
                // 预检和插入之间被抢先，换下一个 attempt
                Err(ShortifyError::AliasTaken(_)) => {
                    debug!("Lost insert race for code '{}', regenerating", code);
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(ShortifyError::database_operation(
            "Failed to allocate a unique short code",
        ))
    }

    /// 解析短码，未知短码返回 None；本方法绝不修改持久状态
    pub async fn resolve(&self, code: &str) -> Result<Option<String>> {
        let short_key = keys::short(code);

        match self.cache.get(&short_key).await {
            Ok(Some(long_url)) => {
                self.track_cache(true).await;
                return Ok(Some(long_url));
            }
            Ok(None) => self.track_cache(false).await,
            Err(e) => {
                // 缓存不可用降级为纯数据库解析
                warn!("Cache read failed during resolve, falling back to database: {}", e);
            }
        }

        let Some(link) = self.storage.find_by_code(code).await? else {
            return Ok(None);
        };

        self.populate_short(code, &link.long_url).await;
        Ok(Some(link.long_url))
    }

    // ============ 缓存回填与计数（全部尽力而为） ============

    async fn populate_short(&self, code: &str, long_url: &str) {
        if let Err(e) = self
            .cache
            .set_ex(&keys::short(code), long_url, self.cache_ttl)
            .await
        {
            warn!("Failed to populate short:{} cache entry: {}", code, e);
        }
    }

    async fn populate_both(&self, code: &str, long_url: &str) {
        self.populate_short(code, long_url).await;
        if let Err(e) = self
            .cache
            .set_ex(&keys::long(long_url), code, self.cache_ttl)
            .await
        {
            warn!("Failed to populate long: cache entry for '{}': {}", code, e);
        }
    }

    async fn track_cache(&self, hit: bool) {
        let key = if hit {
            keys::CACHE_HITS
        } else {
            keys::CACHE_MISSES
        };
        if let Err(e) = self.cache.incr(key).await {
            debug!("Cache counter update failed: {}", e);
        }
    }
}
