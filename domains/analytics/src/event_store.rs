use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
use insights_errors::EventStoreError;
use insights_models::OrderStatus;
use uuid::Uuid;

use crate::time_window::TimeWindow;

/// Which event table a metric reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    Orders,
    Reviews,
}

/// Non-time attribute an event can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Provider,
    Customer,
    Category,
    City,
    Rating,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Provider => "provider",
            Dimension::Customer => "customer",
            Dimension::Category => "category",
            Dimension::City => "city",
            Dimension::Rating => "rating",
        }
    }

    /// Label used when an event carries no value for this dimension.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            Dimension::Category => "uncategorized",
            _ => "unknown",
        }
    }
}

/// Row filter applied by the store before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventPredicate {
    pub source: EventSource,
    /// Tenant scope; `None` reads the whole platform.
    pub provider_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

impl EventPredicate {
    pub fn completed_orders() -> Self {
        Self {
            source: EventSource::Orders,
            provider_id: None,
            status: Some(OrderStatus::Completed),
        }
    }

    pub fn reviews() -> Self {
        Self {
            source: EventSource::Reviews,
            provider_id: None,
            status: None,
        }
    }

    pub fn for_provider(mut self, provider_id: Uuid) -> Self {
        self.provider_id = Some(provider_id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSelector {
    /// `orders.total_price`
    OrderTotal,
    /// Every event counts as 1.
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accumulator {
    Sum,
    Count,
}

/// What to measure: which events, which value, how to reduce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricDefinition {
    pub predicate: EventPredicate,
    pub value: ValueSelector,
    pub accumulator: Accumulator,
}

impl MetricDefinition {
    pub fn revenue(predicate: EventPredicate) -> Self {
        Self {
            predicate,
            value: ValueSelector::OrderTotal,
            accumulator: Accumulator::Sum,
        }
    }

    pub fn count(predicate: EventPredicate) -> Self {
        Self {
            predicate,
            value: ValueSelector::Unit,
            accumulator: Accumulator::Count,
        }
    }

    /// Contribution of one event carrying `value`.
    pub fn contribution(&self, value: f64) -> f64 {
        match (self.accumulator, self.value) {
            (Accumulator::Count, _) | (Accumulator::Sum, ValueSelector::Unit) => {
                1.0
            }
            (Accumulator::Sum, _) => value,
        }
    }
}

/// How the store groups matching events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKeySpec {
    Total,
    HourOfDay,
    DayOfWeek,
    DayOfMonth,
    MonthOfYear,
    CalendarDay,
    Dimension(Dimension),
}

/// Native group key as returned by the store.
///
/// Weekday runs 1 (Sunday) to 7 (Saturday), month 1 (January) to 12,
/// day of month 1 to 31. Hours are 0 to 23. All are read in the window's
/// local offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Total,
    Hour(u32),
    Weekday(u32),
    DayOfMonth(u32),
    Month(u32),
    Date(NaiveDate),
    Dimension(String),
}

impl GroupKey {
    /// Native time key of a local timestamp; `None` for dimension specs.
    pub fn for_timestamp(
        spec: GroupKeySpec, local: DateTime<FixedOffset>,
    ) -> Option<Self> {
        let key = match spec {
            GroupKeySpec::Total => GroupKey::Total,
            GroupKeySpec::HourOfDay => GroupKey::Hour(local.hour()),
            GroupKeySpec::DayOfWeek => {
                GroupKey::Weekday(local.weekday().number_from_sunday())
            }
            GroupKeySpec::DayOfMonth => GroupKey::DayOfMonth(local.day()),
            GroupKeySpec::MonthOfYear => GroupKey::Month(local.month()),
            GroupKeySpec::CalendarDay => GroupKey::Date(local.date_naive()),
            GroupKeySpec::Dimension(_) => return None,
        };
        Some(key)
    }
}

/// One partial result: the reduced value of every event sharing `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub key: GroupKey,
    pub value: f64,
}

impl GroupedRow {
    pub fn new(key: GroupKey, value: f64) -> Self { Self { key, value } }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub group_keys: HashMap<Dimension, String>,
}

impl MetricEvent {
    pub fn group_key(&self, dimension: Dimension) -> Option<&str> {
        self.group_keys.get(&dimension).map(String::as_str)
    }
}

/// Read side of the event log.
///
/// Implementations filter by `metric.predicate` and the half-open window,
/// then reduce per group. Groups without events may be omitted, and rows
/// come back in no particular order.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn query_grouped(
        &self, metric: &MetricDefinition, window: &TimeWindow,
        group: GroupKeySpec,
    ) -> Result<Vec<GroupedRow>, EventStoreError>;

    async fn query_raw(
        &self, predicate: &EventPredicate, window: &TimeWindow,
    ) -> Result<Vec<MetricEvent>, EventStoreError>;
}
