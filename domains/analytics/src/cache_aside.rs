use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;
use redis_connection::{CacheClient, key::CacheKey};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

/// Default bound on a single cache call.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Get-or-compute-and-store in front of an expensive computation.
///
/// The cache is an accelerator only: a failed, slow or undecodable read is
/// a miss, and a failed write is logged and dropped.
#[derive(Clone)]
pub struct CacheAside {
    client: Arc<dyn CacheClient>,
    timeout: Duration,
}

impl CacheAside {
    pub fn new(client: Arc<dyn CacheClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn with_default_timeout(client: Arc<dyn CacheClient>) -> Self {
        Self::new(client, DEFAULT_CACHE_TIMEOUT)
    }

    /// Returns the cached value under `key` or runs `compute` and stores
    /// its result for `ttl`. A zero `ttl` skips the write.
    pub async fn with_cache<T, E, F, Fut>(
        &self, key: &str, ttl: Duration, compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if ttl.is_zero() {
            debug!(cache.key = key, "caching disabled for family");
            return compute().await;
        }

        if let Some(hit) = self.read::<T>(key).await {
            debug!(cache.key = key, "cache hit");
            return Ok(hit);
        }
        debug!(cache.key = key, "cache miss");

        let value = compute().await?;
        self.write(key, &value, ttl).await;

        Ok(value)
    }

    /// Typed variant resolving the key from a [`CacheKey`] declaration.
    pub async fn get_or_compute<K, E, F, Fut>(
        &self, key: &K, args: K::Args<'_>, ttl: Duration, compute: F,
    ) -> Result<K::Value, E>
    where
        K: CacheKey,
        K::Value: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<K::Value, E>>,
    {
        let key = key.get_key_with_args(args);
        self.with_cache(&key, ttl, compute).await
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match tokio::time::timeout(self.timeout, self.client.get(key))
            .await
        {
            Ok(Ok(found)) => found?,
            Ok(Err(err)) => {
                warn!(cache.key = key, error = %err, "cache read failed");
                return None;
            }
            Err(_) => {
                warn!(cache.key = key, timeout = ?self.timeout, "cache read timed out");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(cache.key = key, error = %err, "discarding undecodable cache entry");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                warn!(cache.key = key, error = %err, "cache payload not serializable");
                return;
            }
        };

        match tokio::time::timeout(self.timeout, self.client.set(key, payload, ttl))
            .await
        {
            Ok(Ok(())) => debug!(cache.key = key, ttl = ?ttl, "cache stored"),
            Ok(Err(err)) => {
                warn!(cache.key = key, error = %err, "cache write failed")
            }
            Err(_) => {
                warn!(cache.key = key, timeout = ?self.timeout, "cache write timed out")
            }
        }
    }
}
