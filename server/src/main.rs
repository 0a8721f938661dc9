mod config;

use std::sync::Arc;

use analytics::{AggregationEngine, CacheAside, TimeWindowResolver};
use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use insights_dao::PostgresEventStore;
use insights_http::InsightsServices;
use redis_connection::{CacheClient, Memory, RedisCache, connect_redis_db};
use sql_connection::{SqlConnect, connect_postgres_db};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use crate::config::{AppConfig, CacheBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    info!(
        reporting_offset = %config.reporting_offset,
        cache_backend = ?config.cache_backend,
        store_timeout = ?config.store_timeout,
        cache_timeout = ?config.cache_timeout,
        "Configuration loaded"
    );

    let db = connect_postgres_db(&config.database).await?;
    info!("PostgreSQL connection pool initialized");

    let store = PostgresEventStore::new(db.clone());
    store.migrate().await?;
    info!("Event tables ready");

    let cache: Arc<dyn CacheClient> = match config.cache_backend {
        CacheBackend::Redis => {
            let pool = connect_redis_db(&config.redis).await?;
            info!("Redis cache backend initialized");
            Arc::new(RedisCache::new(pool))
        }
        CacheBackend::Memory => {
            info!(capacity = config.memory.capacity, "In-memory cache backend initialized");
            Arc::new(Memory::new(config.memory.clone()))
        }
    };

    let services = InsightsServices::new(
        AggregationEngine::new(Arc::new(store), config.store_timeout),
        CacheAside::new(cache, config.cache_timeout),
        TimeWindowResolver::new(config.reporting_offset),
        config.ttl,
    );

    let app = Router::new()
        .route("/health", get(health_check))
        .with_state(db)
        .merge(insights_http::router(services))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/docs"))
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Marketplace insights server starting on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        insights_http::get_insights,
        insights_http::get_overview,
        insights_http::get_revenue_trend,
        insights_http::get_order_trend,
        insights_http::get_category_mix,
        insights_http::get_city_distribution,
        insights_http::get_hourly_activity,
        insights_http::get_weekly_performance,
        insights_http::admin::get_platform_overview,
        insights_http::admin::get_platform_revenue_trend,
        insights_http::admin::get_top_providers,
        insights_http::admin::get_rating_distribution
    ),
    components(
        schemas(
            insights_models::Filter,
            insights_models::AggregateResult,
            insights_models::WindowSpan,
            insights_models::Overview,
            insights_models::WeeklyPerformance,
            insights_models::CompositeInsights,
            insights_models::PlatformOverview,
            insights_models::ProviderRevenue,
            insights_models::RatingDistribution,
            insights_models::Pagination,
            insights_queries::ReportQuery,
            insights_queries::TopProvidersQuery,
            common_errors::ApiErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "insights", description = "Per-provider dashboard metrics"),
        (name = "admin", description = "Marketplace-wide reporting")
    ),
    info(
        title = "Marketplace Insights API",
        description = "Time-bucketed revenue, order and review reporting",
        version = "1.0.0"
    )
)]
struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up, with connection pool status", body = String)
    ),
    tag = "health"
)]
async fn health_check(State(db): State<SqlConnect>) -> impl IntoResponse {
    let (available, size) = db.pool_status();
    let replica = if db.has_read_replica() {
        "configured"
    }
    else {
        "not configured"
    };

    (
        StatusCode::OK,
        format!("OK - Pool: {available}/{size} available (read replica {replica})"),
    )
}
