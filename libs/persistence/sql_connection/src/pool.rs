use std::time::Duration;

use deadpool_postgres::{
    BuildError, Manager, ManagerConfig, Pool, RecyclingMethod,
};
use tokio_postgres::NoTls;
use tracing::{debug, info, instrument, warn};

use crate::{
    SqlConnect,
    config::{DbConnectConfig, DbOptionsConfig},
};

#[derive(Debug, thiserror::Error)]
pub enum ConnectPostgresError {
    #[error("Invalid postgres uri: {0}")]
    Uri(#[from] tokio_postgres::Error),
    #[error("Failed to build postgres pool: {0}")]
    Build(#[from] BuildError),
}

/// Pre-warms a connection pool by creating connections up front
async fn prewarm_pool(pool: &Pool, count: u32) {
    debug!("Pre-warming pool with {} connections", count);
    let mut handles = vec![];

    for i in 0..count {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = pool.get().await {
                warn!("Failed to pre-warm connection {}: {}", i + 1, e);
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    let status = pool.status();
    info!(
        "Pool pre-warming complete: {} connections available",
        status.available
    );
}

pub fn build_pool(
    uri: &str, max_conn: Option<u32>,
) -> Result<Pool, ConnectPostgresError> {
    let pg_config = uri.parse::<tokio_postgres::Config>()?;

    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, mgr_config);

    let mut pool_builder = Pool::builder(mgr)
        .runtime(deadpool_postgres::Runtime::Tokio1) // Required for timeout support
        .wait_timeout(Some(Duration::from_millis(2000)))
        .create_timeout(Some(Duration::from_millis(5000)))
        .recycle_timeout(Some(Duration::from_millis(100)));

    if let Some(max_conn) = max_conn {
        pool_builder = pool_builder.max_size(max_conn as usize);
    }

    Ok(pool_builder.build()?)
}

#[instrument(skip_all, name = "connect-pgsql")]
pub async fn connect_postgres_db<C>(
    config: &C,
) -> Result<SqlConnect, ConnectPostgresError>
where
    C: DbConnectConfig + DbOptionsConfig,
{
    info!(
        postgres.max_conn = ?config.max_conn(),
        postgres.min_conn = ?config.min_conn(),
        postgres.read_replica = config.read_replica_uri().is_some(),
        postgres.sql_logger = config.sql_logger()
    );

    let pool = build_pool(config.uri(), config.max_conn())?;
    if let Some(min_conn) = config.min_conn() {
        prewarm_pool(&pool, min_conn).await;
    }

    match config.read_replica_uri() {
        Some(read_uri) => {
            let read_pool = build_pool(read_uri, config.max_conn())?;
            info!("Read replica connection pool initialized");
            Ok(SqlConnect::new_with_read_replica(pool, read_pool))
        }
        None => Ok(SqlConnect::new(pool)),
    }
}
