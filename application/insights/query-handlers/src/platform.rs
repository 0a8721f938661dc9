use std::collections::HashMap;

use analytics::{
    AggregationEngine, BucketScheme, CacheAside, Dimension, EventPredicate,
    MetricDefinition, TimeWindow, TimeWindowResolver, ratio,
};
use insights_cache_keys::{
    PlatformOverviewCacheKey, PlatformRevenueTrendCacheKey,
    ProviderRankingCacheKey, RatingDistributionCacheKey,
};
use insights_errors::InsightsError;
use insights_models::{
    AggregateResult, Paginated, Pagination, PlatformOverview, ProviderRevenue,
    RatingDistribution,
};
use insights_queries::{PageRequest, ReportQuery};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::{CacheTtlConfig, secs};

/// Star ratings a review can carry.
pub const RATING_SCALE: std::ops::RangeInclusive<u32> = 1..=5;

/// Admin reporting across every provider.
#[derive(Clone)]
pub struct PlatformInsights {
    engine: AggregationEngine,
    cache: CacheAside,
    resolver: TimeWindowResolver,
    ttl: CacheTtlConfig,
}

impl PlatformInsights {
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

    #[instrument(skip(self))]
    pub async fn platform_overview(
        &self, query: &ReportQuery,
    ) -> Result<PlatformOverview, InsightsError> {
        let window = self.window(query)?;
        let tag = window.cache_tag(query.filter());
        let predicate = EventPredicate::completed_orders();

        self.cache
            .get_or_compute(
                &PlatformOverviewCacheKey,
                (tag.as_str(),),
                secs(self.ttl.platform_overview),
                || async {
                    let revenue = MetricDefinition::revenue(predicate);
                    let orders = MetricDefinition::count(predicate);
                    let (
                        total_revenue,
                        total_orders,
                        active_providers,
                        active_customers,
                    ) = tokio::try_join!(
                        self.engine.scalar(&window, &revenue),
                        self.engine.scalar(&window, &orders),
                        self.engine.distinct_count(
                            &window,
                            &predicate,
                            Dimension::Provider
                        ),
                        self.engine.distinct_count(
                            &window,
                            &predicate,
                            Dimension::Customer
                        ),
                    )?;

                    Ok(PlatformOverview {
                        total_revenue,
                        total_orders: total_orders.round() as u64,
                        average_order_value: ratio(total_revenue, total_orders),
                        active_providers,
                        active_customers,
                    })
                },
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn platform_revenue_trend(
        &self, query: &ReportQuery,
    ) -> Result<AggregateResult, InsightsError> {
        let window = self.window(query)?;
        let tag = window.cache_tag(query.filter());
        let scheme = BucketScheme::for_filter(query.filter());
        let metric = MetricDefinition::revenue(EventPredicate::completed_orders());

        self.cache
            .get_or_compute(
                &PlatformRevenueTrendCacheKey,
                (tag.as_str(),),
                secs(self.ttl.platform_revenue_trend),
                || self.engine.aggregate(&window, &scheme, &metric),
            )
            .await
    }

    /// Providers ranked by revenue, highest first, ties by provider id.
    ///
    /// The full ranking is cached once per window; pages are cut from it.
    #[instrument(skip(self))]
    pub async fn top_providers(
        &self, query: &ReportQuery, page: PageRequest,
    ) -> Result<Paginated<ProviderRevenue>, InsightsError> {
        let window = self.window(query)?;
        let tag = window.cache_tag(query.filter());

        let ranking = self
            .cache
            .get_or_compute(
                &ProviderRankingCacheKey,
                (tag.as_str(),),
                secs(self.ttl.provider_ranking),
                || self.provider_ranking(&window),
            )
            .await?;

        Ok(paginate(ranking, page))
    }

    /// Review counts per star with the mean rating.
    #[instrument(skip(self))]
    pub async fn rating_distribution(
        &self, query: &ReportQuery,
    ) -> Result<RatingDistribution, InsightsError> {
        let window = self.window(query)?;
        let tag = window.cache_tag(query.filter());
        let reviews = EventPredicate::reviews();

        self.cache
            .get_or_compute(
                &RatingDistributionCacheKey,
                (tag.as_str(),),
                secs(self.ttl.rating_distribution),
                || async {
                    let counts = MetricDefinition::count(reviews);
                    let per_star = self
                        .engine
                        .ranked(&window, &counts, Dimension::Rating)
                        .await?;

                    Ok(rating_distribution(per_star))
                },
            )
            .await
    }

    fn window(&self, query: &ReportQuery) -> Result<TimeWindow, InsightsError> {
        self.resolver
            .resolve(query.filter(), query.start_date(), query.end_date())
    }

    async fn provider_ranking(
        &self, window: &TimeWindow,
    ) -> Result<Vec<ProviderRevenue>, InsightsError> {
        let predicate = EventPredicate::completed_orders();
        let revenue = MetricDefinition::revenue(predicate);
        let orders = MetricDefinition::count(predicate);

        let (revenue, orders) = tokio::try_join!(
            self.engine.ranked(window, &revenue, Dimension::Provider),
            self.engine.ranked(window, &orders, Dimension::Provider),
        )?;

        let orders: HashMap<String, f64> = orders.into_iter().collect();
        let mut ranking: Vec<ProviderRevenue> = revenue
            .into_iter()
            .filter_map(|(label, revenue)| {
                let Ok(provider_id) = label.parse::<Uuid>() else {
                    warn!(
                        target: "insights::data_integrity",
                        label = %label,
                        "dropping provider group without a valid id"
                    );
                    return None;
                };
                let orders = orders.get(&label).copied().unwrap_or(0.0);
                Some(ProviderRevenue {
                    provider_id,
                    revenue,
                    orders: orders.round() as u64,
                })
            })
            .collect();

        ranking.sort_by(|a, b| {
            b.revenue
                .total_cmp(&a.revenue)
                .then_with(|| a.provider_id.cmp(&b.provider_id))
        });
        Ok(ranking)
    }
}

fn paginate(
    ranking: Vec<ProviderRevenue>, page: PageRequest,
) -> Paginated<ProviderRevenue> {
    let pagination = Pagination::new(ranking.len() as u64, page.page, page.limit);
    let items = ranking
        .into_iter()
        .skip(pagination.offset())
        .take(page.limit as usize)
        .collect();

    Paginated { items, pagination }
}

/// Folds per-star review counts onto the star scale. The mean is taken
/// over the same in-scale reviews that make up `review_count`.
fn rating_distribution(per_star: Vec<(String, f64)>) -> RatingDistribution {
    let labels: Vec<String> = RATING_SCALE.map(|star| star.to_string()).collect();
    let mut values = vec![0.0; labels.len()];

    for (label, count) in per_star {
        let slot = label
            .parse::<u32>()
            .ok()
            .filter(|star| RATING_SCALE.contains(star))
            .map(|star| (star - RATING_SCALE.start()) as usize);
        match slot {
            Some(index) => values[index] += count,
            None => {
                warn!(
                    target: "insights::data_integrity",
                    rating = %label,
                    count,
                    "dropping rating outside the star scale"
                );
            }
        }
    }

    let rating_sum: f64 = RATING_SCALE
        .zip(&values)
        .map(|(star, count)| f64::from(star) * count)
        .sum();
    let distribution = AggregateResult::new(labels, values);
    let review_count = distribution.total.unwrap_or_default();

    RatingDistribution {
        review_count: review_count.round() as u64,
        average_rating: ratio(rating_sum, review_count),
        distribution,
    }
}
