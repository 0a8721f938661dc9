use std::{sync::Arc, time::Duration};

use analytics::{
    AggregationEngine, CacheAside, EventStore, GroupKeySpec, TimeWindowResolver,
};
use insights_errors::InsightsError;
use insights_models::{Filter, OrderStatus};
use insights_query_handlers::{CacheTtlConfig, InsightsComposer};
use insights_queries::ReportQuery;
use test_utils::{
    FailingEventStore, InMemoryEventStore, StoredEvent, TestCache, local, utc,
};
use uuid::Uuid;

fn composer(
    store: Arc<dyn EventStore>, cache: Arc<TestCache>, ttl: CacheTtlConfig,
) -> InsightsComposer {
    // Thursday 2024-03-14, 20:00 UTC
    let resolver =
        TimeWindowResolver::utc().frozen_at(local(0, 2024, 3, 14, 20, 0));
    InsightsComposer::new(
        AggregationEngine::new(store, Duration::from_secs(2)),
        CacheAside::new(cache, Duration::from_millis(200)),
        resolver,
        ttl,
    )
}

fn seeded(tenant: Uuid) -> Arc<InMemoryEventStore> {
    let regular = Uuid::now_v7();
    Arc::new(InMemoryEventStore::with_events([
        StoredEvent::order(tenant, utc(2024, 3, 14, 9, 15, 0), 10.0)
            .with_customer(regular)
            .with_category("cleaning")
            .with_city("lagos"),
        StoredEvent::order(tenant, utc(2024, 3, 14, 9, 40, 0), 10.0)
            .with_customer(regular)
            .with_category("cleaning")
            .with_city("abuja"),
        StoredEvent::order(tenant, utc(2024, 3, 5, 18, 0, 0), 5.0)
            .with_category("plumbing")
            .with_city("lagos"),
        StoredEvent::order(tenant, utc(2024, 3, 14, 11, 0, 0), 50.0)
            .with_status(OrderStatus::Cancelled),
        StoredEvent::order(Uuid::now_v7(), utc(2024, 3, 14, 11, 0, 0), 70.0),
    ]))
}

#[tokio::test]
async fn test_compose_insights_for_month() {
    test_utils::init_tracing();
    let tenant = Uuid::now_v7();
    let composer = composer(
        seeded(tenant),
        Arc::new(TestCache::healthy()),
        CacheTtlConfig::default(),
    );

    let insights = composer
        .compose_insights(tenant, &ReportQuery::new(Filter::Month))
        .await
        .unwrap();

    assert_eq!(insights.tenant_id, tenant);
    assert_eq!(insights.filter, Filter::Month);
    assert_eq!(insights.overview.total_revenue, 25.0);
    assert_eq!(insights.overview.total_orders, 3);
    assert_eq!(insights.overview.active_customers, 2);
    assert!((insights.overview.average_order_value - 25.0 / 3.0).abs() < 1e-9);

    assert_eq!(insights.revenue_trend.values, vec![5.0, 20.0, 0.0, 0.0, 0.0]);
    assert_eq!(insights.order_trend.values, vec![1.0, 2.0, 0.0, 0.0, 0.0]);

    assert_eq!(insights.category_mix.labels, vec!["cleaning", "plumbing"]);
    assert_eq!(insights.category_mix.values, vec![20.0, 5.0]);
    assert_eq!(insights.city_distribution.labels, vec!["lagos", "abuja"]);
    assert_eq!(insights.city_distribution.values, vec![2.0, 1.0]);

    assert_eq!(insights.hourly_activity.values.len(), 24);
    assert_eq!(insights.hourly_activity.values[9], 2.0);
    assert_eq!(insights.hourly_activity.values[18], 1.0);
}

#[tokio::test]
async fn test_second_composite_is_served_from_cache() {
    let tenant = Uuid::now_v7();
    let store = seeded(tenant);
    let composer = composer(
        store.clone(),
        Arc::new(TestCache::healthy()),
        CacheTtlConfig::default(),
    );
    let query = ReportQuery::new(Filter::Month);

    let first = composer.compose_insights(tenant, &query).await.unwrap();
    let calls = store.total_calls();
    let second = composer.compose_insights(tenant, &query).await.unwrap();

    assert!(calls > 0);
    assert_eq!(store.total_calls(), calls);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_zero_ttl_recomputes_every_call() {
    let tenant = Uuid::now_v7();
    let store = seeded(tenant);
    let cache = Arc::new(TestCache::healthy());
    let composer =
        composer(store.clone(), cache.clone(), CacheTtlConfig::disabled());
    let query = ReportQuery::new(Filter::Today);

    composer.revenue_trend(tenant, &query).await.unwrap();
    composer.revenue_trend(tenant, &query).await.unwrap();

    assert_eq!(store.grouped_calls(), 2);
    assert_eq!(cache.sets(), 0);
}

#[tokio::test]
async fn test_unreachable_cache_does_not_change_results() {
    let tenant = Uuid::now_v7();
    let healthy = composer(
        seeded(tenant),
        Arc::new(TestCache::healthy()),
        CacheTtlConfig::default(),
    );
    let degraded = composer(
        seeded(tenant),
        Arc::new(TestCache::down()),
        CacheTtlConfig::default(),
    );
    let query = ReportQuery::new(Filter::Month);

    let expected = healthy.compose_insights(tenant, &query).await.unwrap();
    let actual = degraded.compose_insights(tenant, &query).await.unwrap();

    assert_eq!(expected, actual);
}

#[tokio::test]
async fn test_filters_do_not_share_cache_entries() {
    let tenant = Uuid::now_v7();
    let composer = composer(
        seeded(tenant),
        Arc::new(TestCache::healthy()),
        CacheTtlConfig::default(),
    );

    let month = composer
        .revenue_trend(tenant, &ReportQuery::new(Filter::Month))
        .await
        .unwrap();
    let today = composer
        .revenue_trend(tenant, &ReportQuery::new(Filter::Today))
        .await
        .unwrap();
    let custom = composer
        .revenue_trend(tenant, &ReportQuery::custom("01-03-2024", "14-03-2024"))
        .await
        .unwrap();

    assert_eq!(month.values.len(), 5);
    assert_eq!(today.values.len(), 24);
    assert_eq!(custom.labels, vec!["2024-03-05", "2024-03-14"]);
    assert_eq!(custom.values, vec![5.0, 20.0]);
}

#[tokio::test]
async fn test_one_failing_metric_fails_the_composite() {
    let tenant = Uuid::now_v7();
    let store: Arc<dyn EventStore> =
        Arc::new(FailingEventStore::on(seeded(tenant), GroupKeySpec::HourOfDay));
    let composer = composer(
        store,
        Arc::new(TestCache::healthy()),
        CacheTtlConfig::default(),
    );
    let query = ReportQuery::new(Filter::Month);

    let err = composer.compose_insights(tenant, &query).await.unwrap_err();
    let overview = composer.overview(tenant, &query).await;

    assert!(matches!(err, InsightsError::Dependency(_)));
    assert!(overview.is_ok());
}

#[tokio::test]
async fn test_custom_without_bounds_never_reaches_the_store() {
    let tenant = Uuid::now_v7();
    let store = seeded(tenant);
    let composer = composer(
        store.clone(),
        Arc::new(TestCache::healthy()),
        CacheTtlConfig::default(),
    );
    let query = ReportQuery::new(Filter::Custom);

    let err = composer.compose_insights(tenant, &query).await.unwrap_err();

    assert!(matches!(
        err,
        InsightsError::Validation {
            field: "start_date",
            ..
        }
    ));
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_weekly_performance_is_a_dense_trailing_week() {
    let tenant = Uuid::now_v7();
    let store = Arc::new(InMemoryEventStore::with_events([
        StoredEvent::order(tenant, utc(2024, 3, 7, 23, 59, 59), 99.0),
        StoredEvent::order(tenant, utc(2024, 3, 8, 0, 0, 0), 3.0),
        StoredEvent::order(tenant, utc(2024, 3, 14, 9, 15, 0), 10.0),
        StoredEvent::order(tenant, utc(2024, 3, 14, 19, 0, 0), 10.0),
    ]));
    let composer = composer(
        store,
        Arc::new(TestCache::healthy()),
        CacheTtlConfig::default(),
    );

    let weekly = composer.weekly_performance(tenant).await.unwrap();

    assert_eq!(weekly.revenue.labels.len(), 7);
    assert_eq!(weekly.revenue.labels[0], "2024-03-08");
    assert_eq!(weekly.revenue.labels[6], "2024-03-14");
    assert_eq!(weekly.revenue.values, vec![3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 20.0]);
    assert_eq!(weekly.orders.values, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
    assert_eq!(weekly.orders.total, Some(3.0));
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let tenant = Uuid::now_v7();
    let stranger = Uuid::now_v7();
    let composer = composer(
        seeded(tenant),
        Arc::new(TestCache::healthy()),
        CacheTtlConfig::default(),
    );
    let query = ReportQuery::new(Filter::Month);

    let mine = composer.overview(tenant, &query).await.unwrap();
    let theirs = composer.overview(stranger, &query).await.unwrap();

    assert_eq!(mine.total_orders, 3);
    assert_eq!(theirs.total_orders, 0);
    assert_eq!(theirs.average_order_value, 0.0);
}
