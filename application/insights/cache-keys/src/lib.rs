use insights_models::{
    AggregateResult, Overview, PlatformOverview, ProviderRevenue,
    RatingDistribution, WeeklyPerformance,
};
use redis_connection::cache_key;
use uuid::Uuid;

// Tenant scoped families. `window` is the resolved window tag.
cache_key!(OverviewCacheKey::<Overview> => "insights:overview:{}:{}"[tenant: Uuid, window: str]);
cache_key!(RevenueTrendCacheKey::<AggregateResult> => "insights:revenue_trend:{}:{}"[tenant: Uuid, window: str]);
cache_key!(OrderTrendCacheKey::<AggregateResult> => "insights:order_trend:{}:{}"[tenant: Uuid, window: str]);
cache_key!(CategoryMixCacheKey::<AggregateResult> => "insights:category_mix:{}:{}"[tenant: Uuid, window: str]);
cache_key!(CityDistributionCacheKey::<AggregateResult> => "insights:city_distribution:{}:{}"[tenant: Uuid, window: str]);
cache_key!(HourlyActivityCacheKey::<AggregateResult> => "insights:hourly_activity:{}:{}"[tenant: Uuid, window: str]);
cache_key!(WeeklyPerformanceCacheKey::<WeeklyPerformance> => "insights:weekly_performance:{}:{}"[tenant: Uuid, window: str]);

// Platform wide families.
cache_key!(PlatformOverviewCacheKey::<PlatformOverview> => "platform:overview:{}"[window: str]);
cache_key!(PlatformRevenueTrendCacheKey::<AggregateResult> => "platform:revenue_trend:{}"[window: str]);
cache_key!(ProviderRankingCacheKey::<Vec<ProviderRevenue>> => "platform:provider_ranking:{}"[window: str]);
cache_key!(RatingDistributionCacheKey::<RatingDistribution> => "platform:rating_distribution:{}"[window: str]);

#[cfg(test)]
mod tests {
    use redis_connection::key::CacheKey;

    use super::*;

    #[test]
    fn test_tenant_keys_are_namespaced_per_family() {
        let tenant = Uuid::nil();
        let window = "month:2024-03-01:2024-03-15";

        let revenue = RevenueTrendCacheKey.get_key_with_args((&tenant, window));
        let orders = OrderTrendCacheKey.get_key_with_args((&tenant, window));

        assert_eq!(
            revenue,
            "insights:revenue_trend:00000000-0000-0000-0000-000000000000:month:2024-03-01:2024-03-15"
        );
        assert_ne!(revenue, orders);
    }

    #[test]
    fn test_platform_keys_carry_no_tenant() {
        let key = PlatformOverviewCacheKey.get_key_with_args(("year:2024-01-01:2024-03-15",));
        assert_eq!(key, "platform:overview:year:2024-01-01:2024-03-15");
    }
}
