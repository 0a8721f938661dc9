use std::time::Duration;

use bytes::Bytes;
use deadpool_redis::{Config, Runtime};
use redis_connection::{
    CacheClient, CacheError, RedisCache,
    config::{DbConnectConfig, RedisDbConfig},
};

fn redis_cache_from_env() -> Option<RedisCache> {
    let url = std::env::var("REDIS_URL").ok()?;
    let pool = Config::from_url(url)
        .create_pool(Some(Runtime::Tokio1))
        .ok()?;
    Some(RedisCache::new(pool))
}

#[tokio::test]
async fn test_redis_db_config_from_json() {
    let json = r#"{
        "host": "redis.example.com",
        "port": 6380,
        "db": 1
    }"#;

    let config: RedisDbConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.host(), "redis.example.com");
    assert_eq!(config.port(), 6380);
    assert_eq!(config.db(), 1);
    assert_eq!(config.password(), None);
}

#[tokio::test]
async fn test_redis_db_config_defaults_from_empty_json() {
    let config: RedisDbConfig = serde_json::from_str("{}").unwrap();

    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.port(), 6379);
    assert_eq!(config.db(), 0);
}

#[tokio::test]
async fn test_unreachable_redis_reports_unavailable() {
    let pool = Config::from_url("redis://127.0.0.1:1/0")
        .create_pool(Some(Runtime::Tokio1))
        .unwrap();
    let cache = RedisCache::new(pool);

    let result = cache.get("insights:any").await;

    assert!(matches!(result, Err(CacheError::Unavailable(_))));
}

#[tokio::test]
async fn test_redis_cache_roundtrip() {
    let Some(cache) = redis_cache_from_env() else {
        println!("Skipping redis test - REDIS_URL not set.");
        return;
    };

    let key = format!("test:{}", std::process::id());
    cache
        .set(&key, Bytes::from_static(b"{\"a\":1}"), Duration::from_secs(5))
        .await
        .unwrap();

    let value = cache.get(&key).await.unwrap();
    assert_eq!(value.as_deref(), Some(&b"{\"a\":1}"[..]));
}

#[tokio::test]
async fn test_redis_cache_rejects_zero_ttl() {
    let Some(cache) = redis_cache_from_env() else {
        println!("Skipping redis test - REDIS_URL not set.");
        return;
    };

    let result = cache
        .set("test:zero", Bytes::from_static(b"v"), Duration::ZERO)
        .await;

    assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
}
