use analytics::{
    Accumulator, Dimension, EventPredicate, EventSource, GroupKeySpec,
    MetricDefinition, TimeWindow, ValueSelector,
};
use chrono::Utc;
use tokio_postgres::types::ToSql;

pub type PgParam = dyn ToSql + Sync;
pub type PgParamVec = Vec<Box<dyn ToSql + Sync + Send>>;

/// SQL text plus its positional parameters.
pub struct SqlQuery {
    pub sql: String,
    pub params: PgParamVec,
}

impl SqlQuery {
    pub fn param_refs(&self) -> Vec<&PgParam> {
        self.params.iter().map(|p| p.as_ref() as &PgParam).collect()
    }
}

#[derive(Default)]
struct Binder {
    params: PgParamVec,
}

impl Binder {
    fn bind<T>(&mut self, value: T) -> String
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.params.push(Box::new(value));
        format!("${}", self.params.len())
    }
}

pub(crate) fn table(source: EventSource) -> &'static str {
    match source {
        EventSource::Orders => "orders",
        EventSource::Reviews => "reviews",
    }
}

/// Grouped aggregate: `(group_key, value)` rows, or a single `value`
/// column for [`GroupKeySpec::Total`].
pub fn grouped_query(
    metric: &MetricDefinition, window: &TimeWindow, group: GroupKeySpec,
) -> SqlQuery {
    let mut binder = Binder::default();
    let source = metric.predicate.source;
    let filter = where_clause(&mut binder, &metric.predicate, window);
    let value = aggregate_expr(metric);

    let sql = match group {
        GroupKeySpec::Total => {
            format!(
                "SELECT {value} AS value FROM {} WHERE {filter}",
                table(source)
            )
        }
        spec => {
            let key = key_expr(&mut binder, source, spec, window);
            format!(
                "SELECT {key} AS group_key, {value} AS value FROM {} WHERE \
                 {filter} GROUP BY 1",
                table(source)
            )
        }
    };

    SqlQuery {
        sql,
        params: binder.params,
    }
}

/// One row per matching event with every dimension as text.
pub fn raw_query(predicate: &EventPredicate, window: &TimeWindow) -> SqlQuery {
    let mut binder = Binder::default();
    let filter = where_clause(&mut binder, predicate, window);
    let source = predicate.source;

    let value = match source {
        EventSource::Orders => "total_price",
        EventSource::Reviews => "rating::float8",
    };
    let sql = format!(
        "SELECT created_at, {value} AS value, {}, {}, {}, {}, {} FROM {} \
         WHERE {filter}",
        dimension_expr(source, Dimension::Provider),
        dimension_expr(source, Dimension::Customer),
        dimension_expr(source, Dimension::Category),
        dimension_expr(source, Dimension::City),
        dimension_expr(source, Dimension::Rating),
        table(source)
    );

    SqlQuery {
        sql,
        params: binder.params,
    }
}

/// Dimension order of the text columns returned by [`raw_query`].
pub const RAW_DIMENSIONS: [Dimension; 5] = [
    Dimension::Provider,
    Dimension::Customer,
    Dimension::Category,
    Dimension::City,
    Dimension::Rating,
];

fn where_clause(
    binder: &mut Binder, predicate: &EventPredicate, window: &TimeWindow,
) -> String {
    let mut clauses = vec![
        format!(
            "created_at >= {}",
            binder.bind(window.start().with_timezone(&Utc))
        ),
        format!("created_at < {}", binder.bind(window.end().with_timezone(&Utc))),
    ];

    if let Some(provider_id) = predicate.provider_id {
        clauses.push(format!("provider_id = {}", binder.bind(provider_id)));
    }

    if predicate.source == EventSource::Orders {
        if let Some(status) = predicate.status {
            clauses.push(format!(
                "status = {}",
                binder.bind(status.as_str().to_string())
            ));
        }
    }

    clauses.join(" AND ")
}

fn aggregate_expr(metric: &MetricDefinition) -> String {
    match metric.accumulator {
        Accumulator::Count => "COUNT(*)::float8".to_string(),
        Accumulator::Sum => {
            format!(
                "COALESCE(SUM({}), 0)::float8",
                value_expr(metric.predicate.source, metric.value)
            )
        }
    }
}

fn value_expr(source: EventSource, selector: ValueSelector) -> &'static str {
    match (source, selector) {
        (_, ValueSelector::Unit) => "1",
        (EventSource::Orders, ValueSelector::OrderTotal) => "total_price",
        _ => "0",
    }
}

fn key_expr(
    binder: &mut Binder, source: EventSource, spec: GroupKeySpec,
    window: &TimeWindow,
) -> String {
    let mut local = || {
        let offset = f64::from(window.offset().local_minus_utc());
        format!(
            "((created_at AT TIME ZONE 'UTC') + make_interval(secs => {}))",
            binder.bind(offset)
        )
    };

    match spec {
        GroupKeySpec::Total => "0".to_string(),
        GroupKeySpec::HourOfDay => format!("EXTRACT(HOUR FROM {})::int", local()),
        GroupKeySpec::DayOfWeek => {
            format!("(EXTRACT(DOW FROM {})::int + 1)", local())
        }
        GroupKeySpec::DayOfMonth => format!("EXTRACT(DAY FROM {})::int", local()),
        GroupKeySpec::MonthOfYear => {
            format!("EXTRACT(MONTH FROM {})::int", local())
        }
        GroupKeySpec::CalendarDay => format!("({})::date", local()),
        GroupKeySpec::Dimension(dimension) => dimension_expr(source, dimension),
    }
}

fn dimension_expr(source: EventSource, dimension: Dimension) -> String {
    let fallback = dimension.fallback_label();
    match (source, dimension) {
        (_, Dimension::Provider) => "provider_id::text".to_string(),
        (_, Dimension::Customer) => "customer_id::text".to_string(),
        (EventSource::Orders, Dimension::Category) => {
            format!("COALESCE(NULLIF(category, ''), '{fallback}')")
        }
        (EventSource::Orders, Dimension::City) => {
            format!("COALESCE(NULLIF(city, ''), '{fallback}')")
        }
        (EventSource::Reviews, Dimension::Rating) => "rating::text".to_string(),
        _ => format!("'{fallback}'::text"),
    }
}
