use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use moka::{Expiry, future::Cache};

use super::r#trait::{CacheClient, CacheError, CacheResult};
use crate::config::MemoryConfig;

#[derive(Clone)]
struct Entry {
    bytes: Bytes,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self, _key: &String, value: &Entry, _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self, _key: &String, value: &Entry, _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process moka cache, used when no Redis is configured and in tests.
#[derive(Clone)]
pub struct Memory {
    memory: Cache<String, Entry>,
    config: MemoryConfig,
}

impl Memory {
    pub fn new(config: MemoryConfig) -> Self {
        let memory = Cache::builder()
            .max_capacity(config.capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { memory, config }
    }
}

impl Default for Memory {
    fn default() -> Self { Self::new(MemoryConfig::default()) }
}

#[async_trait]
impl CacheClient for Memory {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        Ok(self.memory.get(key).await.map(|entry| entry.bytes))
    }

    async fn set(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }

        let ttl = ttl.min(self.config.max_ttl());
        self.memory
            .insert(key.to_string(), Entry { bytes: value, ttl })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_returns_same_bytes() {
        let cache = Memory::default();
        cache
            .set("k", Bytes::from_static(b"payload"), Duration::from_secs(60))
            .await
            .unwrap();

        let value = cache.get("k").await.unwrap();
        assert_eq!(value.as_deref(), Some(&b"payload"[..]));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = Memory::default();
        assert!(cache.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites_entry() {
        let cache = Memory::default();
        let ttl = Duration::from_secs(60);
        cache.set("k", Bytes::from_static(b"one"), ttl).await.unwrap();
        cache.set("k", Bytes::from_static(b"two"), ttl).await.unwrap();

        let value = cache.get("k").await.unwrap();
        assert_eq!(value.as_deref(), Some(&b"two"[..]));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_rejected() {
        let cache = Memory::default();
        let result = cache
            .set("k", Bytes::from_static(b"v"), Duration::ZERO)
            .await;
        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = Memory::default();
        cache
            .set("k", Bytes::from_static(b"v"), Duration::from_millis(50))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("k").await.unwrap().is_none());
    }
}
