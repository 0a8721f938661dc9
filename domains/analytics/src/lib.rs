pub mod aggregations;
pub mod cache_aside;
pub mod event_store;
pub mod time_buckets;
pub mod time_window;

pub use aggregations::{AggregationEngine, DEFAULT_STORE_TIMEOUT, ratio, reduce_onto_scheme};
pub use cache_aside::{CacheAside, DEFAULT_CACHE_TIMEOUT};
pub use event_store::{
    Accumulator, Dimension, EventPredicate, EventSource, EventStore, GroupKey,
    GroupKeySpec, GroupedRow, MetricDefinition, MetricEvent, ValueSelector,
};
pub use time_buckets::BucketScheme;
pub use time_window::{CUSTOM_DATE_FORMAT, TimeWindow, TimeWindowResolver};
