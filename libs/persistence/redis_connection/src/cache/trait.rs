use std::{sync::Arc, time::Duration};

use bytes::Bytes;

/// Cache-specific error type that doesn't depend on Redis
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Invalid TTL: {0:?}")]
    InvalidTtl(Duration),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Byte-level key/value cache with per-entry expiry.
///
/// Implementations are shared across requests, so every method takes
/// `&self`; pooling and locking are the backend's concern.
#[async_trait::async_trait]
pub trait CacheClient: Send + Sync {
    /// Returns `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>>;

    /// Overwrites the whole entry.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration)
    -> CacheResult<()>;
}

#[async_trait::async_trait]
impl<T> CacheClient for Arc<T>
where
    T: CacheClient + ?Sized,
{
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn set(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        (**self).set(key, value, ttl).await
    }
}
