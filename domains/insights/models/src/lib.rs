use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Coarse reporting period selected by the caller.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    Today,
    Week,
    #[default]
    Month,
    Year,
    Custom,
}

impl Filter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::Today => "today",
            Filter::Week => "week",
            Filter::Month => "month",
            Filter::Year => "year",
            Filter::Custom => "custom",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Chart-ready series: `values[i]` belongs to `labels[i]`.
///
/// `total` is the plain sum of `values`. It is absent for series whose
/// total is not meaningful as a sum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AggregateResult {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total: Option<f64>,
}

impl AggregateResult {
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(labels.len(), values.len());
        let total = values.iter().sum();
        Self {
            labels,
            values,
            total: Some(total),
        }
    }

    pub fn without_total(mut self) -> Self {
        self.total = None;
        self
    }
}

/// Resolved reporting window echoed back to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WindowSpan {
    pub start: DateTime<FixedOffset>,
    /// Exclusive upper bound.
    pub end: DateTime<FixedOffset>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Overview {
    pub total_revenue: f64,
    pub total_orders: u64,
    pub average_order_value: f64,
    pub active_customers: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyPerformance {
    pub window: WindowSpan,
    pub revenue: AggregateResult,
    pub orders: AggregateResult,
}

/// Everything a provider dashboard renders for one period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompositeInsights {
    pub tenant_id: Uuid,
    pub filter: Filter,
    pub window: WindowSpan,
    pub overview: Overview,
    pub revenue_trend: AggregateResult,
    pub order_trend: AggregateResult,
    pub category_mix: AggregateResult,
    pub city_distribution: AggregateResult,
    pub hourly_activity: AggregateResult,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlatformOverview {
    pub total_revenue: f64,
    pub total_orders: u64,
    pub average_order_value: f64,
    pub active_providers: u64,
    pub active_customers: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderRevenue {
    pub provider_id: Uuid,
    pub revenue: f64,
    pub orders: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RatingDistribution {
    pub distribution: AggregateResult,
    pub review_count: u64,
    pub average_rating: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            total,
            page,
            limit,
            pages,
        }
    }

    /// Items to skip before this page. Saturates for pages past any
    /// addressable offset, which then read as empty.
    pub fn offset(&self) -> usize {
        self.page
            .saturating_sub(1)
            .checked_mul(self.limit)
            .and_then(|offset| usize::try_from(offset).ok())
            .unwrap_or(usize::MAX)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
