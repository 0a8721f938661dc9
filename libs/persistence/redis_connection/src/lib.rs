use deadpool_redis::{Config, CreatePoolError, Pool, Runtime};
pub use deadpool_redis::PoolError;
pub use redis::RedisError;
use tracing::{info, instrument};
use url::Url;

pub mod cache;
pub mod config;
pub mod key;
pub mod macros;

pub use cache::{CacheClient, CacheError, CacheResult, Memory, RedisCache};

#[derive(Debug, thiserror::Error)]
pub enum ConnectRedisError {
    #[error("Invalid redis url: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid redis endpoint {host}:{port}")]
    Endpoint { host: String, port: u16 },
    #[error("Failed to create redis pool: {0}")]
    Pool(#[from] CreatePoolError),
}

pub fn redis_url<C>(config: &C) -> Result<Url, ConnectRedisError>
where
    C: config::DbConnectConfig,
{
    let invalid = || {
        ConnectRedisError::Endpoint {
            host: config.host().to_string(),
            port: config.port(),
        }
    };

    let mut url = Url::parse("redis://")?;
    url.set_host(Some(config.host()))?;
    url.set_port(Some(config.port())).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .push(&config.db().to_string());

    Ok(url)
}

#[instrument(skip_all, name = "connect-redis")]
pub async fn connect_redis_db<C>(config: &C) -> Result<Pool, ConnectRedisError>
where
    C: config::DbConnectConfig,
{
    let url = redis_url(config)?;

    info!(redis.url = %url, redis.connect = true);

    let cfg = Config {
        url: Some(url.to_string()),
        pool: Some(deadpool_redis::PoolConfig::default()),
        connection: None,
    };

    let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
    Ok(pool)
}
