use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::AsyncCommands;
use tracing::instrument;

use super::r#trait::{CacheClient, CacheError, CacheResult};

/// Redis cache implementation using deadpool Redis pool
#[derive(Clone)]
pub struct RedisCache {
    pool: deadpool_redis::Pool,
}

impl RedisCache {
    pub fn new(pool: deadpool_redis::Pool) -> Self { Self { pool } }

    async fn connection(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl CacheClient for RedisCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let mut conn = self.connection().await?;
        let raw: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Command(e.to_string()))?;
        Ok(raw.map(Bytes::from))
    }

    #[instrument(skip(self, value))]
    async fn set(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        // SETEX rejects a zero expiry
        if ttl.as_secs() == 0 {
            return Err(CacheError::InvalidTtl(ttl));
        }

        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(key, value.as_ref(), ttl.as_secs())
            .await
            .map_err(|e| CacheError::Command(e.to_string()))?;
        Ok(())
    }
}
