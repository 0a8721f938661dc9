use deadpool_postgres::{Object, Pool, PoolError};

#[derive(Debug, Clone)]
pub struct SqlConnect {
    pool: Pool,
    read_pool: Option<Pool>,
}

impl SqlConnect {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            read_pool: None,
        }
    }

    pub fn new_with_read_replica(pool: Pool, read_pool: Pool) -> Self {
        Self {
            pool,
            read_pool: Some(read_pool),
        }
    }

    /// Get connection for write operations (always uses primary database)
    pub async fn get_client(&self) -> Result<Object, PoolError> {
        self.pool.get().await
    }

    /// Get connection optimized for heavy analytics queries
    pub async fn get_analytics_client(&self) -> Result<Object, PoolError> {
        match &self.read_pool {
            Some(read_pool) => read_pool.get().await,
            None => self.pool.get().await,
        }
    }

    pub fn has_read_replica(&self) -> bool { self.read_pool.is_some() }

    /// (available, size) of the primary pool
    pub fn pool_status(&self) -> (usize, usize) {
        let status = self.pool.status();
        (status.available, status.size)
    }
}
