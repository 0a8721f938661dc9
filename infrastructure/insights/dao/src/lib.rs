mod sql;
mod store;

pub use sql::{PgParam, PgParamVec, SqlQuery, grouped_query, raw_query};
pub use store::{PostgresEventStore, SCHEMA};
