use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use redis_connection::{CacheClient, CacheError, CacheResult, Memory};

/// In-process cache that counts calls and can be told to misbehave.
pub struct TestCache {
    inner: Memory,
    fail_reads: bool,
    fail_writes: bool,
    delay: Option<Duration>,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl TestCache {
    pub fn healthy() -> Self {
        Self {
            inner: Memory::default(),
            fail_reads: false,
            fail_writes: false,
            delay: None,
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        }
    }

    /// Every call errors, as if the backend were unreachable.
    pub fn down() -> Self {
        Self {
            fail_reads: true,
            fail_writes: true,
            ..Self::healthy()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::healthy()
        }
    }

    /// Every call stalls for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::healthy()
        }
    }

    pub fn gets(&self) -> usize { self.gets.load(Ordering::SeqCst) }

    pub fn sets(&self) -> usize { self.sets.load(Ordering::SeqCst) }

    /// Stored bytes, bypassing counters and failure modes.
    pub async fn raw(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key).await.ok().flatten()
    }

    /// Plants `value` under `key`, bypassing counters and failure modes.
    pub async fn put_raw(&self, key: &str, value: impl Into<Bytes>) {
        let _ = self
            .inner
            .set(key, value.into(), Duration::from_secs(60))
            .await;
    }

    async fn stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CacheClient for TestCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_reads {
            return Err(CacheError::Unavailable("cache is down".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_writes {
            return Err(CacheError::Command("READONLY replica".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }
}
