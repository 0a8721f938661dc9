use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, Offset,
    TimeDelta, Utc,
};
use insights_errors::InsightsError;
use insights_models::{Filter, WindowSpan};

/// Date format accepted for caller supplied custom bounds.
pub const CUSTOM_DATE_FORMAT: &str = "%d-%m-%Y";

/// Half-open reporting interval `[start, end)` in the reporting offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn new(
        start: DateTime<FixedOffset>, end: DateTime<FixedOffset>,
    ) -> Result<Self, InsightsError> {
        if start > end {
            return Err(InsightsError::validation(
                "end_date",
                "must not be before start_date",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<FixedOffset> { self.start }

    pub fn end(&self) -> DateTime<FixedOffset> { self.end }

    pub fn offset(&self) -> FixedOffset { *self.start.offset() }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let instant = instant.with_timezone(&self.offset());
        instant >= self.start && instant < self.end
    }

    /// First local calendar day covered by the window.
    pub fn first_day(&self) -> NaiveDate { self.start.date_naive() }

    /// Last local calendar day covered by the window.
    pub fn last_day(&self) -> NaiveDate {
        if self.end <= self.start {
            return self.first_day();
        }
        (self.end - TimeDelta::nanoseconds(1)).date_naive()
    }

    /// Stable tag identifying the window inside cache keys.
    pub fn cache_tag(&self, filter: Filter) -> String {
        format!(
            "{}:{}:{}",
            filter,
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }

    pub fn span(&self) -> WindowSpan {
        WindowSpan {
            start: self.start,
            end: self.end,
        }
    }
}

/// Turns a coarse filter into a concrete [`TimeWindow`].
#[derive(Debug, Clone, Copy)]
pub struct TimeWindowResolver {
    offset: FixedOffset,
    frozen: Option<DateTime<FixedOffset>>,
}

impl Default for TimeWindowResolver {
    fn default() -> Self { Self::utc() }
}

impl TimeWindowResolver {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            frozen: None,
        }
    }

    pub fn utc() -> Self { Self::new(Utc.fix()) }

    /// Pins "now" to `instant` for every later resolution.
    pub fn frozen_at(mut self, instant: DateTime<FixedOffset>) -> Self {
        self.frozen = Some(instant.with_timezone(&self.offset));
        self
    }

    pub fn offset(&self) -> FixedOffset { self.offset }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.frozen
            .unwrap_or_else(|| Utc::now().with_timezone(&self.offset))
    }

    pub fn resolve(
        &self, filter: Filter, raw_start: Option<&str>, raw_end: Option<&str>,
    ) -> Result<TimeWindow, InsightsError> {
        self.resolve_at(filter, raw_start, raw_end, self.now())
    }

    /// Same as [`resolve`](Self::resolve) against an explicit clock reading.
    ///
    /// Bounds are ignored for every filter except [`Filter::Custom`].
    pub fn resolve_at(
        &self, filter: Filter, raw_start: Option<&str>, raw_end: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<TimeWindow, InsightsError> {
        let today = now.with_timezone(&self.offset).date_naive();

        let first = match filter {
            Filter::Today => today,
            Filter::Week => {
                today - Days::new(today.weekday().num_days_from_sunday().into())
            }
            Filter::Month => today - Days::new(today.day0().into()),
            Filter::Year => today - Days::new(today.ordinal0().into()),
            Filter::Custom => return self.custom(raw_start, raw_end),
        };

        TimeWindow::new(
            self.midnight("filter", first)?,
            self.midnight("filter", next_day("filter", today)?)?,
        )
    }

    /// The `days` local calendar days ending with today, today included.
    pub fn trailing_days(
        &self, days: u32, now: DateTime<FixedOffset>,
    ) -> Result<TimeWindow, InsightsError> {
        let today = now.with_timezone(&self.offset).date_naive();
        let first = today
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .ok_or_else(|| out_of_range("days"))?;
        TimeWindow::new(
            self.midnight("days", first)?,
            self.midnight("days", next_day("days", today)?)?,
        )
    }

    fn custom(
        &self, raw_start: Option<&str>, raw_end: Option<&str>,
    ) -> Result<TimeWindow, InsightsError> {
        let first = parse_bound("start_date", raw_start)?;
        let last = parse_bound("end_date", raw_end)?;

        if first > last {
            return Err(InsightsError::validation(
                "end_date",
                format!(
                    "{} is before start_date {}",
                    last.format(CUSTOM_DATE_FORMAT),
                    first.format(CUSTOM_DATE_FORMAT)
                ),
            ));
        }

        TimeWindow::new(
            self.midnight("start_date", first)?,
            self.midnight("end_date", next_day("end_date", last)?)?,
        )
    }

    /// Local midnight opening `date`, failing when it falls outside the
    /// representable calendar.
    fn midnight(
        &self, field: &'static str, date: NaiveDate,
    ) -> Result<DateTime<FixedOffset>, InsightsError> {
        let local = date.and_time(NaiveTime::MIN);
        let utc = local
            .checked_sub_signed(TimeDelta::seconds(i64::from(
                self.offset.local_minus_utc(),
            )))
            .ok_or_else(|| out_of_range(field))?;
        Ok(DateTime::from_naive_utc_and_offset(utc, self.offset))
    }
}

fn next_day(
    field: &'static str, date: NaiveDate,
) -> Result<NaiveDate, InsightsError> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| out_of_range(field))
}

fn out_of_range(field: &'static str) -> InsightsError {
    InsightsError::validation(field, "out of range")
}

fn parse_bound(
    field: &'static str, raw: Option<&str>,
) -> Result<NaiveDate, InsightsError> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty()).ok_or_else(
        || InsightsError::validation(field, "is required for a custom range"),
    )?;

    NaiveDate::parse_from_str(raw, CUSTOM_DATE_FORMAT).map_err(|_| {
        InsightsError::validation(
            field,
            format!("expected DD-MM-YYYY, got {raw:?}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    fn at(
        resolver: &TimeWindowResolver, y: i32, m: u32, d: u32, h: u32, min: u32,
    ) -> DateTime<FixedOffset> {
        resolver
            .offset()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    fn field_of(err: InsightsError) -> &'static str {
        match err {
            InsightsError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_today_spans_local_midnight_to_next_midnight() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 3, 14, 15, 30);

        let window = resolver.resolve_at(Filter::Today, None, None, now).unwrap();

        assert_eq!(window.start(), at(&resolver, 2024, 3, 14, 0, 0));
        assert_eq!(window.end(), at(&resolver, 2024, 3, 15, 0, 0));
        assert!(window.start() <= now && now < window.end());
    }

    #[test]
    fn test_week_starts_on_most_recent_sunday() {
        let resolver = TimeWindowResolver::utc();
        // 2024-03-14 is a Thursday
        let now = at(&resolver, 2024, 3, 14, 8, 0);

        let window = resolver.resolve_at(Filter::Week, None, None, now).unwrap();

        assert_eq!(window.first_day(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(window.last_day(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    }

    #[test]
    fn test_week_on_a_sunday_is_a_single_day() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 3, 10, 23, 59);

        let window = resolver.resolve_at(Filter::Week, None, None, now).unwrap();

        assert_eq!(window.first_day(), window.last_day());
        assert_eq!(window.end() - window.start(), TimeDelta::days(1));
    }

    #[test]
    fn test_month_and_year_start_on_the_first() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 3, 14, 8, 0);

        let month = resolver.resolve_at(Filter::Month, None, None, now).unwrap();
        let year = resolver.resolve_at(Filter::Year, None, None, now).unwrap();

        assert_eq!(month.start(), at(&resolver, 2024, 3, 1, 0, 0));
        assert_eq!(year.start(), at(&resolver, 2024, 1, 1, 0, 0));
        assert_eq!(month.end(), year.end());
    }

    #[test]
    fn test_non_custom_filters_ignore_bounds() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 3, 14, 8, 0);

        let window = resolver
            .resolve_at(Filter::Today, Some("garbage"), Some("01-01-1999"), now)
            .unwrap();

        assert_eq!(window.first_day(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    }

    #[test]
    fn test_custom_covers_the_whole_end_date() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 6, 1, 0, 0);

        let window = resolver
            .resolve_at(Filter::Custom, Some("01-03-2024"), Some("03-03-2024"), now)
            .unwrap();

        assert_eq!(window.start(), at(&resolver, 2024, 3, 1, 0, 0));
        assert_eq!(window.end(), at(&resolver, 2024, 3, 4, 0, 0));
        let last_millisecond = resolver
            .offset()
            .with_ymd_and_hms(2024, 3, 3, 23, 59, 59)
            .unwrap()
            .with_nanosecond(999_000_000)
            .unwrap();
        assert!(window.contains(last_millisecond.with_timezone(&Utc)));
    }

    #[test]
    fn test_custom_single_day_range() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 6, 1, 0, 0);

        let window = resolver
            .resolve_at(Filter::Custom, Some("05-03-2024"), Some("05-03-2024"), now)
            .unwrap();

        assert_eq!(window.end() - window.start(), TimeDelta::days(1));
    }

    #[test]
    fn test_custom_missing_bound_names_the_field() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 6, 1, 0, 0);

        let missing_start = resolver
            .resolve_at(Filter::Custom, None, Some("03-03-2024"), now)
            .unwrap_err();
        let missing_end = resolver
            .resolve_at(Filter::Custom, Some("01-03-2024"), Some("  "), now)
            .unwrap_err();

        assert_eq!(field_of(missing_start), "start_date");
        assert_eq!(field_of(missing_end), "end_date");
    }

    #[test]
    fn test_custom_rejects_iso_dates_and_reversed_ranges() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 6, 1, 0, 0);

        let iso = resolver
            .resolve_at(Filter::Custom, Some("2024-03-01"), Some("03-03-2024"), now)
            .unwrap_err();
        let reversed = resolver
            .resolve_at(Filter::Custom, Some("04-03-2024"), Some("03-03-2024"), now)
            .unwrap_err();

        assert_eq!(field_of(iso), "start_date");
        assert_eq!(field_of(reversed), "end_date");
    }

    #[test]
    fn test_custom_bounds_at_the_calendar_edge_are_rejected() {
        let now = at(&TimeWindowResolver::utc(), 2024, 6, 1, 0, 0);

        for resolver in [
            TimeWindowResolver::utc(),
            TimeWindowResolver::new(FixedOffset::east_opt(3 * 3600).unwrap()),
            TimeWindowResolver::new(FixedOffset::west_opt(5 * 3600).unwrap()),
        ] {
            let err = resolver
                .resolve_at(Filter::Custom, Some("01-03-2024"), Some("31-12-+262142"), now)
                .unwrap_err();
            assert_eq!(field_of(err), "end_date");
        }
    }

    #[test]
    fn test_offset_shifts_local_midnight() {
        let resolver =
            TimeWindowResolver::new(FixedOffset::east_opt(3 * 3600).unwrap());
        // 22:30 UTC on the 14th is 01:30 on the 15th at +03:00
        let now = Utc
            .with_ymd_and_hms(2024, 3, 14, 22, 30, 0)
            .unwrap()
            .with_timezone(&resolver.offset());

        let window = resolver.resolve_at(Filter::Today, None, None, now).unwrap();

        assert_eq!(window.first_day(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(
            window.start().with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 3, 14, 21, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_frozen_clock_drives_resolve() {
        let resolver = TimeWindowResolver::utc();
        let frozen = resolver.frozen_at(at(&resolver, 2023, 7, 4, 12, 0));

        let window = frozen.resolve(Filter::Year, None, None).unwrap();

        assert_eq!(window.first_day(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(window.last_day(), NaiveDate::from_ymd_opt(2023, 7, 4).unwrap());
    }

    #[test]
    fn test_trailing_days_includes_today() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 3, 14, 8, 0);

        let window = resolver.trailing_days(7, now).unwrap();

        assert_eq!(window.first_day(), NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
        assert_eq!(window.last_day(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    }

    #[test]
    fn test_cache_tag_distinguishes_filters_and_ranges() {
        let resolver = TimeWindowResolver::utc();
        let now = at(&resolver, 2024, 3, 14, 8, 0);
        let month = resolver.resolve_at(Filter::Month, None, None, now).unwrap();
        let custom = resolver
            .resolve_at(Filter::Custom, Some("01-03-2024"), Some("14-03-2024"), now)
            .unwrap();

        assert_eq!(month, custom);
        assert_eq!(month.cache_tag(Filter::Month), "month:2024-03-01:2024-03-15");
        assert_ne!(month.cache_tag(Filter::Month), custom.cache_tag(Filter::Custom));
    }
}
