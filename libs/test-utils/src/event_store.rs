use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use analytics::{
    Dimension, EventPredicate, EventSource, EventStore, GroupKey,
    GroupKeySpec, GroupedRow, MetricDefinition, MetricEvent, TimeWindow,
    ValueSelector,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use insights_errors::EventStoreError;
use insights_models::OrderStatus;
use uuid::Uuid;

/// One order or review row held by [`InMemoryEventStore`].
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub source: EventSource,
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub status: Option<OrderStatus>,
    /// Order total or review rating.
    pub value: f64,
    pub category: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Completed order with a fresh customer.
    pub fn order(provider_id: Uuid, created_at: DateTime<Utc>, total: f64) -> Self {
        Self {
            source: EventSource::Orders,
            provider_id,
            customer_id: Uuid::now_v7(),
            status: Some(OrderStatus::Completed),
            value: total,
            category: None,
            city: None,
            created_at,
        }
    }

    pub fn review(provider_id: Uuid, created_at: DateTime<Utc>, rating: u8) -> Self {
        Self {
            source: EventSource::Reviews,
            provider_id,
            customer_id: Uuid::now_v7(),
            status: None,
            value: f64::from(rating),
            category: None,
            city: None,
            created_at,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_customer(mut self, customer_id: Uuid) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    fn matches(&self, predicate: &EventPredicate) -> bool {
        self.source == predicate.source
            && predicate.provider_id.is_none_or(|id| id == self.provider_id)
            && predicate.status.is_none_or(|status| self.status == Some(status))
    }

    fn selected_value(&self, selector: ValueSelector) -> f64 {
        match selector {
            ValueSelector::OrderTotal => self.value,
            ValueSelector::Unit => 1.0,
        }
    }

    fn label(&self, dimension: Dimension) -> String {
        let label = match dimension {
            Dimension::Provider => Some(self.provider_id.to_string()),
            Dimension::Customer => Some(self.customer_id.to_string()),
            Dimension::Category => self.category.clone(),
            Dimension::City => self.city.clone(),
            Dimension::Rating => Some(format!("{}", self.value as i64)),
        };
        label.unwrap_or_else(|| dimension.fallback_label().to_string())
    }
}

/// Event store over a vector, grouping the way the Postgres adapter does.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<StoredEvent>>,
    injected: Mutex<Vec<GroupedRow>>,
    grouped_calls: AtomicUsize,
    raw_calls: AtomicUsize,
}

impl InMemoryEventStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_events(events: impl IntoIterator<Item = StoredEvent>) -> Self {
        let store = Self::new();
        store.extend(events);
        store
    }

    pub fn push(&self, event: StoredEvent) {
        self.events.lock().expect("events lock").push(event);
    }

    pub fn extend(&self, events: impl IntoIterator<Item = StoredEvent>) {
        self.events.lock().expect("events lock").extend(events);
    }

    /// Rows appended verbatim to every grouped answer.
    pub fn inject_rows(&self, rows: impl IntoIterator<Item = GroupedRow>) {
        self.injected.lock().expect("injected lock").extend(rows);
    }

    pub fn grouped_calls(&self) -> usize { self.grouped_calls.load(Ordering::SeqCst) }

    pub fn raw_calls(&self) -> usize { self.raw_calls.load(Ordering::SeqCst) }

    pub fn total_calls(&self) -> usize { self.grouped_calls() + self.raw_calls() }

    fn matching(
        &self, predicate: &EventPredicate, window: &TimeWindow,
    ) -> Vec<StoredEvent> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .filter(|event| event.matches(predicate))
            .filter(|event| window.contains(event.created_at))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn query_grouped(
        &self, metric: &MetricDefinition, window: &TimeWindow,
        group: GroupKeySpec,
    ) -> Result<Vec<GroupedRow>, EventStoreError> {
        self.grouped_calls.fetch_add(1, Ordering::SeqCst);

        let mut groups: HashMap<GroupKey, f64> = HashMap::new();
        for event in self.matching(&metric.predicate, window) {
            let key = match group {
                GroupKeySpec::Dimension(dimension) => {
                    GroupKey::Dimension(event.label(dimension))
                }
                spec => {
                    let local = event.created_at.with_timezone(&window.offset());
                    match GroupKey::for_timestamp(spec, local) {
                        Some(key) => key,
                        None => continue,
                    }
                }
            };
            let contribution =
                metric.contribution(event.selected_value(metric.value));
            *groups.entry(key).or_insert(0.0) += contribution;
        }

        let mut rows: Vec<GroupedRow> = groups
            .into_iter()
            .map(|(key, value)| GroupedRow::new(key, value))
            .collect();
        rows.extend(self.injected.lock().expect("injected lock").iter().cloned());
        Ok(rows)
    }

    async fn query_raw(
        &self, predicate: &EventPredicate, window: &TimeWindow,
    ) -> Result<Vec<MetricEvent>, EventStoreError> {
        self.raw_calls.fetch_add(1, Ordering::SeqCst);

        let dimensions = [
            Dimension::Provider,
            Dimension::Customer,
            Dimension::Category,
            Dimension::City,
            Dimension::Rating,
        ];
        Ok(self
            .matching(predicate, window)
            .into_iter()
            .map(|event| MetricEvent {
                timestamp: event.created_at,
                value: event.value,
                group_keys: dimensions
                    .iter()
                    .map(|dimension| (*dimension, event.label(*dimension)))
                    .collect(),
            })
            .collect())
    }
}

/// Store that fails every call, or only calls grouped by one spec.
pub struct FailingEventStore {
    inner: Arc<dyn EventStore>,
    fail_on: Option<GroupKeySpec>,
}

impl FailingEventStore {
    pub fn always() -> Self {
        Self {
            inner: Arc::new(InMemoryEventStore::new()),
            fail_on: None,
        }
    }

    pub fn on(inner: Arc<dyn EventStore>, spec: GroupKeySpec) -> Self {
        Self {
            inner,
            fail_on: Some(spec),
        }
    }

    fn refused() -> EventStoreError {
        EventStoreError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl EventStore for FailingEventStore {
    async fn query_grouped(
        &self, metric: &MetricDefinition, window: &TimeWindow,
        group: GroupKeySpec,
    ) -> Result<Vec<GroupedRow>, EventStoreError> {
        match self.fail_on {
            Some(spec) if spec != group => {
                self.inner.query_grouped(metric, window, group).await
            }
            _ => Err(Self::refused()),
        }
    }

    async fn query_raw(
        &self, predicate: &EventPredicate, window: &TimeWindow,
    ) -> Result<Vec<MetricEvent>, EventStoreError> {
        match self.fail_on {
            Some(_) => self.inner.query_raw(predicate, window).await,
            None => Err(Self::refused()),
        }
    }
}

/// Store that answers with nothing after `delay`.
pub struct SlowEventStore {
    delay: Duration,
}

impl SlowEventStore {
    pub fn new(delay: Duration) -> Self { Self { delay } }
}

#[async_trait]
impl EventStore for SlowEventStore {
    async fn query_grouped(
        &self, _metric: &MetricDefinition, _window: &TimeWindow,
        _group: GroupKeySpec,
    ) -> Result<Vec<GroupedRow>, EventStoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn query_raw(
        &self, _predicate: &EventPredicate, _window: &TimeWindow,
    ) -> Result<Vec<MetricEvent>, EventStoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}
