pub use config::{DbConnectConfig, DbOptionsConfig, PostgresDbConfig};
pub use deadpool_postgres::PoolError;
pub use impl_get_connect::SqlConnect;
pub use pool::{ConnectPostgresError, build_pool, connect_postgres_db};
pub use tokio_postgres::Error as PgError;

pub mod config;
mod impl_get_connect;
mod pool;
