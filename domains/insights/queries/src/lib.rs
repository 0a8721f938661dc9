use insights_errors::InsightsError;
use insights_models::Filter;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;

// ============================================================================
// Query Parameter Structs
// ============================================================================

/// Period selection shared by every report endpoint.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// `today`, `week`, `month` (default), `year` or `custom`
    pub filter: Option<Filter>,
    /// `DD-MM-YYYY`, required with `custom`
    pub start_date: Option<String>,
    /// `DD-MM-YYYY`, required with `custom`
    pub end_date: Option<String>,
}

impl ReportQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn custom(start_date: &str, end_date: &str) -> Self {
        Self {
            filter: Some(Filter::Custom),
            start_date: Some(start_date.to_string()),
            end_date: Some(end_date.to_string()),
        }
    }

    pub fn filter(&self) -> Filter { self.filter.unwrap_or_default() }

    pub fn start_date(&self) -> Option<&str> { self.start_date.as_deref() }

    pub fn end_date(&self) -> Option<&str> { self.end_date.as_deref() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn parse(
        page: Option<u64>, limit: Option<u64>,
    ) -> Result<Self, InsightsError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        if page == 0 {
            return Err(InsightsError::validation(
                "page",
                "must be 1 or greater",
            ));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(InsightsError::validation(
                "limit",
                format!("must be between 1 and {MAX_PAGE_LIMIT}"),
            ));
        }

        Ok(Self { page, limit })
    }
}

/// Platform-wide provider ranking: a period plus a page.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopProvidersQuery {
    pub filter: Option<Filter>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// 1-based, defaults to 1
    pub page: Option<u64>,
    /// 1 to 100, defaults to 10
    pub limit: Option<u64>,
}

impl TopProvidersQuery {
    pub fn report(&self) -> ReportQuery {
        ReportQuery {
            filter: self.filter,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }

    pub fn page(&self) -> Result<PageRequest, InsightsError> {
        PageRequest::parse(self.page, self.limit)
    }
}
