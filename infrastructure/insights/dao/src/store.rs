use analytics::{
    EventPredicate, EventStore, GroupKey, GroupKeySpec, GroupedRow,
    MetricDefinition, MetricEvent, TimeWindow,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use insights_errors::EventStoreError;
use sql_connection::SqlConnect;
use tokio_postgres::Row;
use tracing::{debug, instrument};

use crate::sql::{RAW_DIMENSIONS, grouped_query, raw_query};

/// Tables read by [`PostgresEventStore`].
pub const SCHEMA: &str = include_str!("../migrations/0001_events.sql");

/// [`EventStore`] over the marketplace's `orders` and `reviews` tables.
///
/// Aggregation runs in Postgres; only grouped partials cross the wire.
#[derive(Clone)]
pub struct PostgresEventStore {
    db: SqlConnect,
}

impl PostgresEventStore {
    pub fn new(db: SqlConnect) -> Self { Self { db } }

    /// Creates the event tables when they are missing.
    #[instrument(skip_all)]
    pub async fn migrate(&self) -> Result<(), EventStoreError> {
        let client = self.db.get_client().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    #[instrument(skip_all, fields(source = ?metric.predicate.source, group = ?group))]
    async fn query_grouped(
        &self, metric: &MetricDefinition, window: &TimeWindow,
        group: GroupKeySpec,
    ) -> Result<Vec<GroupedRow>, EventStoreError> {
        let query = grouped_query(metric, window, group);
        let client = self.db.get_analytics_client().await?;
        let stmt = client.prepare(&query.sql).await?;
        let rows = client.query(&stmt, &query.param_refs()).await?;

        debug!(rows = rows.len(), "grouped query finished");

        rows.iter().map(|row| grouped_row(row, group)).collect()
    }

    #[instrument(skip_all, fields(source = ?predicate.source))]
    async fn query_raw(
        &self, predicate: &EventPredicate, window: &TimeWindow,
    ) -> Result<Vec<MetricEvent>, EventStoreError> {
        let query = raw_query(predicate, window);
        let client = self.db.get_analytics_client().await?;
        let stmt = client.prepare(&query.sql).await?;
        let rows = client.query(&stmt, &query.param_refs()).await?;

        rows.iter().map(metric_event).collect()
    }
}

fn grouped_row(
    row: &Row, group: GroupKeySpec,
) -> Result<GroupedRow, EventStoreError> {
    if group == GroupKeySpec::Total {
        return Ok(GroupedRow::new(GroupKey::Total, row.try_get(0)?));
    }

    // negative parts cannot occur; map them past every bucket so they drop
    let part = |raw: i32| u32::try_from(raw).unwrap_or(u32::MAX);

    let key = match group {
        GroupKeySpec::Total => GroupKey::Total,
        GroupKeySpec::HourOfDay => GroupKey::Hour(part(row.try_get(0)?)),
        GroupKeySpec::DayOfWeek => GroupKey::Weekday(part(row.try_get(0)?)),
        GroupKeySpec::DayOfMonth => GroupKey::DayOfMonth(part(row.try_get(0)?)),
        GroupKeySpec::MonthOfYear => GroupKey::Month(part(row.try_get(0)?)),
        GroupKeySpec::CalendarDay => {
            GroupKey::Date(row.try_get::<_, NaiveDate>(0)?)
        }
        GroupKeySpec::Dimension(_) => GroupKey::Dimension(row.try_get(0)?),
    };

    Ok(GroupedRow::new(key, row.try_get(1)?))
}

fn metric_event(row: &Row) -> Result<MetricEvent, EventStoreError> {
    let timestamp: DateTime<Utc> = row.try_get(0)?;
    let value: f64 = row.try_get(1)?;

    let mut group_keys = std::collections::HashMap::new();
    for (offset, dimension) in RAW_DIMENSIONS.iter().enumerate() {
        let label: Option<String> = row.try_get(offset + 2)?;
        group_keys.insert(
            *dimension,
            label.unwrap_or_else(|| dimension.fallback_label().to_string()),
        );
    }

    Ok(MetricEvent {
        timestamp,
        value,
        group_keys,
    })
}
