//! 链接创建与解析的端到端行为测试
//!
//! 内存 sqlite + 进程内缓存，覆盖幂等复用、别名冲突、
//! 黑名单负缓存与缓存降级路径。

use std::sync::Arc;

use shortify::cache::{MemoryCache, StringCache, keys};
use shortify::config::RateLimitConfig;
use shortify::errors::ShortifyError;
use shortify::services::blacklist::BlacklistGuard;
use shortify::services::{LinkService, ShortenRequest};
use shortify::storage::SeaOrmStorage;

async fn setup() -> (Arc<SeaOrmStorage>, Arc<MemoryCache>, LinkService) {
    // 连接池必须收到 1，每个 sqlite 内存连接都是独立数据库
    let storage = Arc::new(SeaOrmStorage::connect("sqlite::memory:", 1).await.unwrap());
    let cache = Arc::new(MemoryCache::new());

    let service = LinkService::new(
        Arc::clone(&storage),
        cache.clone() as Arc<dyn StringCache>,
        3600,
        RateLimitConfig {
            create_limit: 1000,
            window_secs: 60,
        },
    );

    (storage, cache, service)
}

fn request(url: &str) -> ShortenRequest {
    ShortenRequest {
        long_url: url.to_string(),
        alias: None,
        client_ip: "203.0.113.9".to_string(),
        owner: None,
    }
}

#[tokio::test]
async fn shorten_then_resolve_round_trip() {
    let (_storage, _cache, service) = setup().await;

    let code = service
        .shorten(request("https://example.com/some/page"))
        .await
        .unwrap();
    assert_eq!(code.len(), 8);

    let resolved = service.resolve(&code).await.unwrap();
    assert_eq!(resolved.as_deref(), Some("https://example.com/some/page"));
}

#[tokio::test]
async fn same_url_reuses_existing_code() {
    let (_storage, _cache, service) = setup().await;

    let first = service.shorten(request("https://example.com/a")).await.unwrap();
    let second = service.shorten(request("https://example.com/a")).await.unwrap();
    assert_eq!(first, second);

    // 归一化后等价的写法也复用同一个短码
    let third = service
        .shorten(request("https://example.com/a#fragment"))
        .await
        .unwrap();
    assert_eq!(first, third);
}

#[tokio::test]
async fn reuse_survives_cache_loss() {
    let (_storage, cache, service) = setup().await;

    let first = service.shorten(request("https://example.com/b")).await.unwrap();

    // 模拟缓存条目过期：直接写入一个立即过期的值覆盖
    cache
        .set_ex(&keys::long("https://example.com/b"), &first, 0)
        .await
        .unwrap();

    let second = service.shorten(request("https://example.com/b")).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn alias_round_trip_and_conflict() {
    let (_storage, _cache, service) = setup().await;

    let mut req = request("https://example.com/promo");
    req.alias = Some("promo".to_string());
    let code = service.shorten(req).await.unwrap();
    assert_eq!(code, "promo");

    let mut conflict = request("https://other.example/page");
    conflict.alias = Some("promo".to_string());
    let err = service.shorten(conflict).await.unwrap_err();
    assert!(matches!(err, ShortifyError::AliasTaken(_)));

    assert_eq!(
        service.resolve("promo").await.unwrap().as_deref(),
        Some("https://example.com/promo")
    );
}

#[tokio::test]
async fn invalid_alias_is_rejected() {
    let (_storage, _cache, service) = setup().await;

    for alias in ["ab", "has space", "bad/slash", &"x".repeat(51)] {
        let mut req = request("https://example.com/x");
        req.alias = Some(alias.to_string());
        let err = service.shorten(req).await.unwrap_err();
        assert!(matches!(err, ShortifyError::Validation(_)), "alias: {}", alias);
    }
}

#[tokio::test]
async fn invalid_url_is_rejected() {
    let (_storage, _cache, service) = setup().await;

    let err = service
        .shorten(request("javascript:alert(1)"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShortifyError::Validation(_)));

    let err = service.shorten(request("   ")).await.unwrap_err();
    assert!(matches!(err, ShortifyError::Validation(_)));
}

#[tokio::test]
async fn unknown_code_resolves_to_none() {
    let (_storage, _cache, service) = setup().await;
    assert_eq!(service.resolve("nosuch12").await.unwrap(), None);
}

#[tokio::test]
async fn blacklisted_domain_is_rejected() {
    let (storage, _cache, service) = setup().await;

    storage.add_blacklist_domain("evil.example").await.unwrap();

    let err = service
        .shorten(request("https://evil.example/page"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShortifyError::BlacklistedDomain(_)));

    // 子域不等于被列入的域
    service
        .shorten(request("https://sub.evil.example.org/page"))
        .await
        .unwrap();
}

#[tokio::test]
async fn blacklist_negative_result_is_cached() {
    let (storage, cache, _service) = setup().await;

    let guard = BlacklistGuard::new(
        Arc::clone(&storage),
        cache as Arc<dyn StringCache>,
        3600,
    );

    assert!(!guard.is_blacklisted("https://late.example/").await.unwrap());

    // 列入发生在负缓存生效之后：TTL 内仍然放行，这是协议允许的陈旧窗口
    storage.add_blacklist_domain("late.example").await.unwrap();
    assert!(!guard.is_blacklisted("https://late.example/").await.unwrap());
}

#[tokio::test]
async fn blacklist_positive_result_is_cached() {
    let (storage, cache, _service) = setup().await;

    storage.add_blacklist_domain("blocked.example").await.unwrap();

    let guard = BlacklistGuard::new(
        Arc::clone(&storage),
        Arc::clone(&cache) as Arc<dyn StringCache>,
        3600,
    );

    assert!(guard.is_blacklisted("https://blocked.example/").await.unwrap());
    assert_eq!(
        cache.get(&keys::blacklist("blocked.example")).await.unwrap().as_deref(),
        Some("1")
    );
}
