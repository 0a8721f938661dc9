use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
    routing::get,
};
use common_errors::AppError;
use insights_models::{
    AggregateResult, Paginated, PlatformOverview, ProviderRevenue,
    RatingDistribution,
};
use insights_queries::{ReportQuery, TopProvidersQuery};
use tracing::instrument;

use crate::{InsightsServices, query_params};

pub struct AdminInsightsHandlers;

impl AdminInsightsHandlers {
    pub fn routes() -> Router<InsightsServices> {
        Router::new()
            .route("/overview", get(get_platform_overview))
            .route("/revenue-trend", get(get_platform_revenue_trend))
            .route("/top-providers", get(get_top_providers))
            .route("/rating-distribution", get(get_rating_distribution))
    }
}

#[utoipa::path(
    get,
    path = "/admin/insights/overview",
    params(ReportQuery),
    responses(
        (status = 200, description = "Marketplace-wide revenue, orders and active actors", body = PlatformOverview),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn get_platform_overview(
    State(services): State<InsightsServices>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<PlatformOverview>, AppError> {
    let query = query_params(query)?;
    let overview = services.platform.platform_overview(&query).await?;
    Ok(Json(overview))
}

#[utoipa::path(
    get,
    path = "/admin/insights/revenue-trend",
    params(ReportQuery),
    responses(
        (status = 200, description = "Marketplace revenue per bucket", body = AggregateResult),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn get_platform_revenue_trend(
    State(services): State<InsightsServices>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<AggregateResult>, AppError> {
    let query = query_params(query)?;
    let trend = services.platform.platform_revenue_trend(&query).await?;
    Ok(Json(trend))
}

#[utoipa::path(
    get,
    path = "/admin/insights/top-providers",
    params(TopProvidersQuery),
    responses(
        (status = 200, description = "Providers ranked by revenue", body = Paginated<ProviderRevenue>),
        (status = 400, description = "Invalid filter, date range or page", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn get_top_providers(
    State(services): State<InsightsServices>,
    query: Result<Query<TopProvidersQuery>, QueryRejection>,
) -> Result<Json<Paginated<ProviderRevenue>>, AppError> {
    let query = query_params(query)?;
    let page = query.page()?;
    let providers = services
        .platform
        .top_providers(&query.report(), page)
        .await?;
    Ok(Json(providers))
}

#[utoipa::path(
    get,
    path = "/admin/insights/rating-distribution",
    params(ReportQuery),
    responses(
        (status = 200, description = "Reviews per star with the mean rating", body = RatingDistribution),
        (status = 400, description = "Invalid filter or date range", body = common_errors::ApiErrorResponse),
        (status = 503, description = "Reporting data temporarily unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn get_rating_distribution(
    State(services): State<InsightsServices>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<RatingDistribution>, AppError> {
    let query = query_params(query)?;
    let ratings = services.platform.rating_distribution(&query).await?;
    Ok(Json(ratings))
}
