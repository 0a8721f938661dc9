pub mod admin;

use analytics::{AggregationEngine, CacheAside, TimeWindowResolver};
use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::Json,
    routing::get,
};
use common_errors::AppError;
use insights_models::{
    AggregateResult, CompositeInsights, Overview, WeeklyPerformance,
};
use insights_queries::ReportQuery;
use insights_query_handlers::{
    CacheTtlConfig, InsightsComposer, PlatformInsights,
};
use tracing::instrument;
use uuid::Uuid;

use crate::admin::AdminInsightsHandlers;

#[derive(Clone)]
pub struct InsightsServices {
    pub composer: InsightsComposer,
    pub platform: PlatformInsights,
}

impl InsightsServices {
    pub fn new(
        engine: AggregationEngine, cache: CacheAside,
        resolver: TimeWindowResolver, ttl: CacheTtlConfig,
    ) -> Self {
        Self {
            composer: InsightsComposer::new(
                engine.clone(),
                cache.clone(),
                resolver,
                ttl,
            ),
            platform: PlatformInsights::new(engine, cache, resolver, ttl),
        }
    }
}

pub struct InsightsHandlers;

impl InsightsHandlers {
    pub fn routes() -> Router<InsightsServices> {
        Router::new()
            .route("/{tenant_id}", get(get_insights))
            .route("/{tenant_id}/overview", get(get_overview))
            .route("/{tenant_id}/revenue-trend", get(get_revenue_trend))
            .route("/{tenant_id}/order-trend", get(get_order_trend))
            .route("/{tenant_id}/category-mix", get(get_category_mix))
            .route(
                "/{tenant_id}/city-distribution",
                get(get_city_distribution),
            )
            .route("/{tenant_id}/hourly-activity", get(get_hourly_activity))
            .route(
                "/{tenant_id}/weekly-performance",
                get(get_weekly_performance),
            )
    }
}

/// Tenant and admin reporting routes with their state applied.
pub fn router(services: InsightsServices) -> Router {
    Router::new()
        .nest("/insights", InsightsHandlers::routes())
        .nest("/admin/insights", AdminInsightsHandlers::routes())
        .with_state(services)
}

pub(crate) fn query_params<T>(
    query: Result<Query<T>, QueryRejection>,
) -> Result<T, AppError> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(QueryRejection::FailedToDeserializeQueryString(err)) => {
            Err(AppError::bad_request_with_details(
                "INVALID_QUERY_PARAMS",
                "Invalid query parameters provided",
                &format!(
                    "Query parameter error: {err}. Expected filter one of \
                     today, week, month, year, custom and dates as DD-MM-YYYY"
                ),
            ))
        }
        Err(_) => {
            Err(AppError::bad_request(
                "INVALID_QUERY_PARAMS",
                "Invalid query parameters provided",
            ))
        }
    }
}

fn tenant_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        AppError::bad_request_with_details(
            "INVALID_PATH_PARAMS",
            "Tenant id must be a UUID",
            &rejection.body_text(),
        )
    })
}

#[utoipa::path(
    get,
    path = "/insights/{tenant_id}",
    params(
        ("tenant_id" = Uuid, Path, description = "Provider the dashboard belongs to"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Every dashboard metric for the period", body = CompositeInsights),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "insights"
)]
#[instrument(skip_all)]
pub async fn get_insights(
    State(services): State<InsightsServices>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<CompositeInsights>, AppError> {
    let tenant = tenant_id(path)?;
    let query = query_params(query)?;
    let insights = services.composer.compose_insights(tenant, &query).await?;
    Ok(Json(insights))
}

#[utoipa::path(
    get,
    path = "/insights/{tenant_id}/overview",
    params(
        ("tenant_id" = Uuid, Path, description = "Provider the dashboard belongs to"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Headline revenue and order figures", body = Overview),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "insights"
)]
#[instrument(skip_all)]
pub async fn get_overview(
    State(services): State<InsightsServices>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<Overview>, AppError> {
    let tenant = tenant_id(path)?;
    let query = query_params(query)?;
    let overview = services.composer.overview(tenant, &query).await?;
    Ok(Json(overview))
}

#[utoipa::path(
    get,
    path = "/insights/{tenant_id}/revenue-trend",
    params(
        ("tenant_id" = Uuid, Path, description = "Provider the dashboard belongs to"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Completed-order revenue per bucket", body = AggregateResult),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "insights"
)]
#[instrument(skip_all)]
pub async fn get_revenue_trend(
    State(services): State<InsightsServices>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<AggregateResult>, AppError> {
    let tenant = tenant_id(path)?;
    let query = query_params(query)?;
    let trend = services.composer.revenue_trend(tenant, &query).await?;
    Ok(Json(trend))
}

#[utoipa::path(
    get,
    path = "/insights/{tenant_id}/order-trend",
    params(
        ("tenant_id" = Uuid, Path, description = "Provider the dashboard belongs to"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Completed-order count per bucket", body = AggregateResult),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "insights"
)]
#[instrument(skip_all)]
pub async fn get_order_trend(
    State(services): State<InsightsServices>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<AggregateResult>, AppError> {
    let tenant = tenant_id(path)?;
    let query = query_params(query)?;
    let trend = services.composer.order_trend(tenant, &query).await?;
    Ok(Json(trend))
}

#[utoipa::path(
    get,
    path = "/insights/{tenant_id}/category-mix",
    params(
        ("tenant_id" = Uuid, Path, description = "Provider the dashboard belongs to"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Revenue per service category, largest first", body = AggregateResult),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "insights"
)]
#[instrument(skip_all)]
pub async fn get_category_mix(
    State(services): State<InsightsServices>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<AggregateResult>, AppError> {
    let tenant = tenant_id(path)?;
    let query = query_params(query)?;
    let mix = services.composer.category_mix(tenant, &query).await?;
    Ok(Json(mix))
}

#[utoipa::path(
    get,
    path = "/insights/{tenant_id}/city-distribution",
    params(
        ("tenant_id" = Uuid, Path, description = "Provider the dashboard belongs to"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Completed orders per city, largest first", body = AggregateResult),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "insights"
)]
#[instrument(skip_all)]
pub async fn get_city_distribution(
    State(services): State<InsightsServices>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<AggregateResult>, AppError> {
    let tenant = tenant_id(path)?;
    let query = query_params(query)?;
    let cities = services.composer.city_distribution(tenant, &query).await?;
    Ok(Json(cities))
}

#[utoipa::path(
    get,
    path = "/insights/{tenant_id}/hourly-activity",
    params(
        ("tenant_id" = Uuid, Path, description = "Provider the dashboard belongs to"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Completed orders per hour of day", body = AggregateResult),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "insights"
)]
#[instrument(skip_all)]
pub async fn get_hourly_activity(
    State(services): State<InsightsServices>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<AggregateResult>, AppError> {
    let tenant = tenant_id(path)?;
    let query = query_params(query)?;
    let hourly = services.composer.hourly_activity(tenant, &query).await?;
    Ok(Json(hourly))
}

/// Always the trailing seven days; period parameters are not accepted.
#[utoipa::path(
    get,
    path = "/insights/{tenant_id}/weekly-performance",
    params(
        ("tenant_id" = Uuid, Path, description = "Provider the dashboard belongs to")
    ),
    responses(
        (status = 200, description = "Revenue and orders for each of the last seven days", body = WeeklyPerformance),
        (status = 400, description = "Invalid tenant id", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "insights"
)]
#[instrument(skip_all)]
pub async fn get_weekly_performance(
    State(services): State<InsightsServices>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WeeklyPerformance>, AppError> {
    let tenant = tenant_id(path)?;
    let weekly = services.composer.weekly_performance(tenant).await?;
    Ok(Json(weekly))
}
