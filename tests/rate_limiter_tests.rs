//! 固定窗口限流行为测试
//!
//! 基于进程内缓存后端与 tokio 的暂停时钟，不依赖真实时间。

use std::sync::Arc;

use shortify::cache::{MemoryCache, StringCache};
use shortify::services::rate_limit::RateLimiter;

fn limiter() -> RateLimiter {
    RateLimiter::new(Arc::new(MemoryCache::new()))
}

#[tokio::test(start_paused = true)]
async fn allows_up_to_limit_then_rejects() {
    let limiter = limiter();

    for _ in 0..10 {
        assert!(limiter.allow("rl:create:203.0.113.1", 10, 60).await);
    }
    assert!(!limiter.allow("rl:create:203.0.113.1", 10, 60).await);
    assert!(!limiter.allow("rl:create:203.0.113.1", 10, 60).await);
}

#[tokio::test(start_paused = true)]
async fn window_resets_after_expiry() {
    let limiter = limiter();

    for _ in 0..10 {
        assert!(limiter.allow("rl:create:203.0.113.2", 10, 60).await);
    }
    assert!(!limiter.allow("rl:create:203.0.113.2", 10, 60).await);

    tokio::time::advance(std::time::Duration::from_secs(61)).await;

    assert!(limiter.allow("rl:create:203.0.113.2", 10, 60).await);
}

#[tokio::test(start_paused = true)]
async fn rejected_calls_keep_counting_but_window_is_not_extended() {
    let limiter = limiter();

    assert!(limiter.allow("rl:create:203.0.113.3", 2, 60).await);

    // 半窗处继续打满并溢出，TTL 不应被重置
    tokio::time::advance(std::time::Duration::from_secs(30)).await;
    assert!(limiter.allow("rl:create:203.0.113.3", 2, 60).await);
    assert!(!limiter.allow("rl:create:203.0.113.3", 2, 60).await);

    // 窗口自首请求起 60 秒后到期，而非自最后一次请求起
    tokio::time::advance(std::time::Duration::from_secs(31)).await;
    assert!(limiter.allow("rl:create:203.0.113.3", 2, 60).await);
}

#[tokio::test(start_paused = true)]
async fn distinct_keys_have_independent_windows() {
    let limiter = limiter();

    assert!(limiter.allow("rl:create:198.51.100.1", 1, 60).await);
    assert!(!limiter.allow("rl:create:198.51.100.1", 1, 60).await);

    assert!(limiter.allow("rl:create:198.51.100.2", 1, 60).await);
}

#[tokio::test(start_paused = true)]
async fn memory_cache_counter_restarts_after_expiry() {
    let cache = MemoryCache::new();

    assert_eq!(cache.incr("counter").await.unwrap(), 1);
    assert_eq!(cache.incr("counter").await.unwrap(), 2);
    cache.expire("counter", 5).await.unwrap();

    tokio::time::advance(std::time::Duration::from_secs(6)).await;

    assert_eq!(cache.incr("counter").await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn memory_cache_get_honors_ttl() {
    let cache = MemoryCache::new();

    cache.set_ex("short:abc", "https://example.com", 10).await.unwrap();
    assert_eq!(
        cache.get("short:abc").await.unwrap().as_deref(),
        Some("https://example.com")
    );

    tokio::time::advance(std::time::Duration::from_secs(11)).await;
    assert_eq!(cache.get("short:abc").await.unwrap(), None);
}
