use analytics::{
    AggregationEngine, BucketScheme, CacheAside, Dimension, EventPredicate,
    MetricDefinition, TimeWindow, TimeWindowResolver, ratio,
};
use insights_cache_keys::{
    CategoryMixCacheKey, CityDistributionCacheKey, HourlyActivityCacheKey,
    OrderTrendCacheKey, OverviewCacheKey, RevenueTrendCacheKey,
    WeeklyPerformanceCacheKey,
};
use insights_errors::InsightsError;
use insights_models::{
    AggregateResult, CompositeInsights, Filter, Overview, WeeklyPerformance,
};
use insights_queries::ReportQuery;
use tracing::instrument;
use uuid::Uuid;

use crate::config::{CacheTtlConfig, secs};

/// Days covered by the weekly performance report, today included.
pub const WEEKLY_PERFORMANCE_DAYS: u32 = 7;

/// Per-tenant dashboard metrics, each cached under its own family.
#[derive(Clone)]
pub struct InsightsComposer {
    engine: AggregationEngine,
    cache: CacheAside,
    resolver: TimeWindowResolver,
    ttl: CacheTtlConfig,
}

impl InsightsComposer {
    pub fn new(
        engine: AggregationEngine, cache: CacheAside,
        resolver: TimeWindowResolver, ttl: CacheTtlConfig,
    ) -> Self {
        Self {
            engine,
            cache,
            resolver,
            ttl,
        }
    }

    /// Every dashboard metric for one period, computed concurrently.
    ///
    /// Fails as a whole when any single metric fails.
    #[instrument(skip(self))]
    pub async fn compose_insights(
        &self, tenant: Uuid, query: &ReportQuery,
    ) -> Result<CompositeInsights, InsightsError> {
        let filter = query.filter();
        let window = self.window(query)?;

        let (
            overview,
            revenue_trend,
            order_trend,
            category_mix,
            city_distribution,
            hourly_activity,
        ) = tokio::try_join!(
            self.overview_in(tenant, filter, &window),
            self.revenue_trend_in(tenant, filter, &window),
            self.order_trend_in(tenant, filter, &window),
            self.category_mix_in(tenant, filter, &window),
            self.city_distribution_in(tenant, filter, &window),
            self.hourly_activity_in(tenant, filter, &window),
        )?;

        Ok(CompositeInsights {
            tenant_id: tenant,
            filter,
            window: window.span(),
            overview,
            revenue_trend,
            order_trend,
            category_mix,
            city_distribution,
            hourly_activity,
        })
    }

    #[instrument(skip(self))]
    pub async fn overview(
        &self, tenant: Uuid, query: &ReportQuery,
    ) -> Result<Overview, InsightsError> {
        let window = self.window(query)?;
        self.overview_in(tenant, query.filter(), &window).await
    }

    #[instrument(skip(self))]
    pub async fn revenue_trend(
        &self, tenant: Uuid, query: &ReportQuery,
    ) -> Result<AggregateResult, InsightsError> {
        let window = self.window(query)?;
        self.revenue_trend_in(tenant, query.filter(), &window).await
    }

    #[instrument(skip(self))]
    pub async fn order_trend(
        &self, tenant: Uuid, query: &ReportQuery,
    ) -> Result<AggregateResult, InsightsError> {
        let window = self.window(query)?;
        self.order_trend_in(tenant, query.filter(), &window).await
    }

    #[instrument(skip(self))]
    pub async fn category_mix(
        &self, tenant: Uuid, query: &ReportQuery,
    ) -> Result<AggregateResult, InsightsError> {
        let window = self.window(query)?;
        self.category_mix_in(tenant, query.filter(), &window).await
    }

    #[instrument(skip(self))]
    pub async fn city_distribution(
        &self, tenant: Uuid, query: &ReportQuery,
    ) -> Result<AggregateResult, InsightsError> {
        let window = self.window(query)?;
        self.city_distribution_in(tenant, query.filter(), &window).await
    }

    #[instrument(skip(self))]
    pub async fn hourly_activity(
        &self, tenant: Uuid, query: &ReportQuery,
    ) -> Result<AggregateResult, InsightsError> {
        let window = self.window(query)?;
        self.hourly_activity_in(tenant, query.filter(), &window).await
    }

    /// Revenue and completed orders for each of the trailing seven days.
    ///
    /// Unlike the `week` filter this is always seven days long.
    #[instrument(skip(self))]
    pub async fn weekly_performance(
        &self, tenant: Uuid,
    ) -> Result<WeeklyPerformance, InsightsError> {
        let window = self
            .resolver
            .trailing_days(WEEKLY_PERFORMANCE_DAYS, self.resolver.now())?;
        let tag = format!(
            "trailing{WEEKLY_PERFORMANCE_DAYS}:{}",
            window.first_day().format("%Y-%m-%d")
        );
        let predicate = tenant_orders(tenant);

        self.cache
            .get_or_compute(
                &WeeklyPerformanceCacheKey,
                (&tenant, tag.as_str()),
                secs(self.ttl.weekly_performance),
                || async {
                    let scheme = BucketScheme::day_range(&window);
                    let revenue = MetricDefinition::revenue(predicate);
                    let orders = MetricDefinition::count(predicate);
                    let (revenue, orders) = tokio::try_join!(
                        self.engine.aggregate(&window, &scheme, &revenue),
                        self.engine.aggregate(&window, &scheme, &orders),
                    )?;

                    Ok(WeeklyPerformance {
                        window: window.span(),
                        revenue,
                        orders,
                    })
                },
            )
            .await
    }

    fn window(&self, query: &ReportQuery) -> Result<TimeWindow, InsightsError> {
        self.resolver
            .resolve(query.filter(), query.start_date(), query.end_date())
    }

    async fn overview_in(
        &self, tenant: Uuid, filter: Filter, window: &TimeWindow,
    ) -> Result<Overview, InsightsError> {
        let tag = window.cache_tag(filter);
        let predicate = tenant_orders(tenant);

        self.cache
            .get_or_compute(
                &OverviewCacheKey,
                (&tenant, tag.as_str()),
                secs(self.ttl.overview),
                || async {
                    let revenue = MetricDefinition::revenue(predicate);
                    let orders = MetricDefinition::count(predicate);
                    let (total_revenue, total_orders, active_customers) =
                        tokio::try_join!(
                            self.engine.scalar(window, &revenue),
                            self.engine.scalar(window, &orders),
                            self.engine.distinct_count(
                                window,
                                &predicate,
                                Dimension::Customer
                            ),
                        )?;

                    Ok(Overview {
                        total_revenue,
                        total_orders: total_orders.round() as u64,
                        average_order_value: ratio(total_revenue, total_orders),
                        active_customers,
                    })
                },
            )
            .await
    }

    async fn revenue_trend_in(
        &self, tenant: Uuid, filter: Filter, window: &TimeWindow,
    ) -> Result<AggregateResult, InsightsError> {
        let tag = window.cache_tag(filter);
        let metric = MetricDefinition::revenue(tenant_orders(tenant));
        let scheme = BucketScheme::for_filter(filter);

        self.cache
            .get_or_compute(
                &RevenueTrendCacheKey,
                (&tenant, tag.as_str()),
                secs(self.ttl.revenue_trend),
                || self.engine.aggregate(window, &scheme, &metric),
            )
            .await
    }

    async fn order_trend_in(
        &self, tenant: Uuid, filter: Filter, window: &TimeWindow,
    ) -> Result<AggregateResult, InsightsError> {
        let tag = window.cache_tag(filter);
        let metric = MetricDefinition::count(tenant_orders(tenant));
        let scheme = BucketScheme::for_filter(filter);

        self.cache
            .get_or_compute(
                &OrderTrendCacheKey,
                (&tenant, tag.as_str()),
                secs(self.ttl.order_trend),
                || self.engine.aggregate(window, &scheme, &metric),
            )
            .await
    }

    // revenue per category
    async fn category_mix_in(
        &self, tenant: Uuid, filter: Filter, window: &TimeWindow,
    ) -> Result<AggregateResult, InsightsError> {
        let tag = window.cache_tag(filter);
        let metric = MetricDefinition::revenue(tenant_orders(tenant));

        self.cache
            .get_or_compute(
                &CategoryMixCacheKey,
                (&tenant, tag.as_str()),
                secs(self.ttl.category_mix),
                || self.engine.breakdown(window, &metric, Dimension::Category, None),
            )
            .await
    }

    // completed orders per customer city
    async fn city_distribution_in(
        &self, tenant: Uuid, filter: Filter, window: &TimeWindow,
    ) -> Result<AggregateResult, InsightsError> {
        let tag = window.cache_tag(filter);
        let metric = MetricDefinition::count(tenant_orders(tenant));

        self.cache
            .get_or_compute(
                &CityDistributionCacheKey,
                (&tenant, tag.as_str()),
                secs(self.ttl.city_distribution),
                || self.engine.breakdown(window, &metric, Dimension::City, None),
            )
            .await
    }

    async fn hourly_activity_in(
        &self, tenant: Uuid, filter: Filter, window: &TimeWindow,
    ) -> Result<AggregateResult, InsightsError> {
        let tag = window.cache_tag(filter);
        let metric = MetricDefinition::count(tenant_orders(tenant));
        let scheme = BucketScheme::HourOfDay;

        self.cache
            .get_or_compute(
                &HourlyActivityCacheKey,
                (&tenant, tag.as_str()),
                secs(self.ttl.hourly_activity),
                || self.engine.aggregate(window, &scheme, &metric),
            )
            .await
    }
}

fn tenant_orders(tenant: Uuid) -> EventPredicate {
    EventPredicate::completed_orders().for_provider(tenant)
}
