use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::Arc,
    time::Duration,
};

use insights_errors::{EventStoreError, InsightsError};
use insights_models::AggregateResult;
use tracing::{debug, instrument, warn};

use crate::{
    event_store::{
        Dimension, EventPredicate, EventStore, GroupKey, GroupKeySpec,
        GroupedRow, MetricDefinition,
    },
    time_buckets::BucketScheme,
    time_window::TimeWindow,
};

/// Default bound on a single event store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reduces grouped store rows into chart-ready series and scalars.
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn EventStore>,
    timeout: Duration,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn EventStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn with_default_timeout(store: Arc<dyn EventStore>) -> Self {
        Self::new(store, DEFAULT_STORE_TIMEOUT)
    }

    /// Dense (or observed-day) series for `metric` over `window`.
    #[instrument(skip(self, metric), fields(scheme = scheme.name()))]
    pub async fn aggregate(
        &self, window: &TimeWindow, scheme: &BucketScheme,
        metric: &MetricDefinition,
    ) -> Result<AggregateResult, InsightsError> {
        let rows = self
            .bounded(self.store.query_grouped(
                metric,
                window,
                scheme.group_key_spec(),
            ))
            .await?;

        debug!(rows = rows.len(), "grouped rows fetched");
        Ok(reduce_onto_scheme(scheme, rows))
    }

    /// Series over a non-time dimension, largest value first.
    ///
    /// Ties are broken by label so the order is stable across calls.
    #[instrument(skip(self, metric), fields(dimension = dimension.as_str()))]
    pub async fn breakdown(
        &self, window: &TimeWindow, metric: &MetricDefinition,
        dimension: Dimension, limit: Option<usize>,
    ) -> Result<AggregateResult, InsightsError> {
        let mut ranked = self.ranked(window, metric, dimension).await?;
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }

        let (labels, values) = ranked.into_iter().unzip();
        Ok(AggregateResult::new(labels, values))
    }

    /// Every group of `dimension` with its reduced value, ranked.
    pub async fn ranked(
        &self, window: &TimeWindow, metric: &MetricDefinition,
        dimension: Dimension,
    ) -> Result<Vec<(String, f64)>, InsightsError> {
        let rows = self
            .bounded(self.store.query_grouped(
                metric,
                window,
                GroupKeySpec::Dimension(dimension),
            ))
            .await?;

        Ok(rank_rows(dimension, rows))
    }

    /// One reduced number over the whole window.
    #[instrument(skip(self, metric))]
    pub async fn scalar(
        &self, window: &TimeWindow, metric: &MetricDefinition,
    ) -> Result<f64, InsightsError> {
        let rows = self
            .bounded(self.store.query_grouped(metric, window, GroupKeySpec::Total))
            .await?;

        Ok(rows.iter().map(|row| row.value).sum())
    }

    /// Number of distinct `dimension` values among matching events.
    #[instrument(skip(self, predicate), fields(dimension = dimension.as_str()))]
    pub async fn distinct_count(
        &self, window: &TimeWindow, predicate: &EventPredicate,
        dimension: Dimension,
    ) -> Result<u64, InsightsError> {
        let events = self.bounded(self.store.query_raw(predicate, window)).await?;

        let distinct: HashSet<&str> = events
            .iter()
            .filter_map(|event| event.group_key(dimension))
            .collect();

        Ok(distinct.len() as u64)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, InsightsError>
    where
        F: Future<Output = Result<T, EventStoreError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(timeout = ?self.timeout, "event store call timed out");
                Err(EventStoreError::Timeout(self.timeout).into())
            }
        }
    }
}

/// `numerator / denominator`, or 0 when there is nothing to divide by.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    }
    else {
        numerator / denominator
    }
}

/// Maps sparse, unordered rows onto the scheme's buckets.
///
/// Observed-day schemes take their labels from the rows themselves. Rows
/// whose key has no bucket are dropped and reported.
pub fn reduce_onto_scheme(
    scheme: &BucketScheme, rows: Vec<GroupedRow>,
) -> AggregateResult {
    let scheme = match scheme {
        BucketScheme::ObservedDays(_) => {
            BucketScheme::observed(rows.iter().filter_map(|row| {
                match row.key {
                    GroupKey::Date(date) => Some(date),
                    _ => None,
                }
            }))
        }
        fixed => fixed.clone(),
    };

    let mut values = vec![0.0; scheme.count()];
    for row in rows {
        match scheme.index_for_key(&row.key) {
            Some(index) if index < values.len() => values[index] += row.value,
            _ => {
                warn!(
                    target: "insights::data_integrity",
                    scheme = scheme.name(),
                    key = ?row.key,
                    value = row.value,
                    "dropping group outside the bucket range"
                );
            }
        }
    }

    AggregateResult::new(scheme.labels(), values)
}

fn rank_rows(dimension: Dimension, rows: Vec<GroupedRow>) -> Vec<(String, f64)> {
    let mut merged: HashMap<String, f64> = HashMap::new();
    for row in rows {
        match row.key {
            GroupKey::Dimension(label) => {
                let label = if label.trim().is_empty() {
                    dimension.fallback_label().to_string()
                }
                else {
                    label
                };
                *merged.entry(label).or_insert(0.0) += row.value;
            }
            other => {
                warn!(
                    target: "insights::data_integrity",
                    dimension = dimension.as_str(),
                    key = ?other,
                    "dropping non-dimension group from breakdown"
                );
            }
        }
    }

    let mut ranked: Vec<(String, f64)> = merged.into_iter().collect();
    ranked.sort_by(|(a_label, a), (b_label, b)| {
        b.total_cmp(a).then_with(|| a_label.cmp(b_label))
    });
    ranked
}
