use chrono::{Days, NaiveDate};
use insights_models::Filter;

use crate::{
    event_store::{GroupKey, GroupKeySpec},
    time_window::TimeWindow,
};

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov",
    "Dec",
];
const HOURS_IN_DAY: usize = 24;
const WEEKS_IN_MONTH: usize = 5;

/// Shape of a time series: how many buckets, their labels, and which
/// bucket a native group key lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketScheme {
    HourOfDay,
    DayOfWeek,
    WeekOfMonth,
    MonthOfYear,
    /// One bucket per distinct observed day, ascending. Empty until the
    /// observed days are known.
    ObservedDays(Vec<NaiveDate>),
    /// Every day from `first`, observed or not.
    DayRange { first: NaiveDate, days: u32 },
}

impl BucketScheme {
    pub fn for_filter(filter: Filter) -> Self {
        match filter {
            Filter::Today => BucketScheme::HourOfDay,
            Filter::Week => BucketScheme::DayOfWeek,
            Filter::Month => BucketScheme::WeekOfMonth,
            Filter::Year => BucketScheme::MonthOfYear,
            Filter::Custom => BucketScheme::ObservedDays(Vec::new()),
        }
    }

    /// Dense per-day scheme covering every local day of `window`.
    pub fn day_range(window: &TimeWindow) -> Self {
        let first = window.first_day();
        let days = (window.last_day() - first).num_days() + 1;
        BucketScheme::DayRange {
            first,
            days: u32::try_from(days.max(0)).unwrap_or(u32::MAX),
        }
    }

    pub fn observed(days: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut days: Vec<NaiveDate> = days.into_iter().collect();
        days.sort_unstable();
        days.dedup();
        BucketScheme::ObservedDays(days)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BucketScheme::HourOfDay => "hour_of_day",
            BucketScheme::DayOfWeek => "day_of_week",
            BucketScheme::WeekOfMonth => "week_of_month",
            BucketScheme::MonthOfYear => "month_of_year",
            BucketScheme::ObservedDays(_) => "observed_days",
            BucketScheme::DayRange { .. } => "day_range",
        }
    }

    pub fn count(&self) -> usize {
        match self {
            BucketScheme::HourOfDay => HOURS_IN_DAY,
            BucketScheme::DayOfWeek => WEEKDAY_LABELS.len(),
            BucketScheme::WeekOfMonth => WEEKS_IN_MONTH,
            BucketScheme::MonthOfYear => MONTH_LABELS.len(),
            BucketScheme::ObservedDays(days) => days.len(),
            BucketScheme::DayRange { days, .. } => *days as usize,
        }
    }

    /// Ordered labels; `labels().len() == count()`.
    pub fn labels(&self) -> Vec<String> {
        match self {
            BucketScheme::HourOfDay => {
                (0..HOURS_IN_DAY).map(|hour| format!("{hour}:00")).collect()
            }
            BucketScheme::DayOfWeek => {
                WEEKDAY_LABELS.iter().map(|l| l.to_string()).collect()
            }
            BucketScheme::WeekOfMonth => {
                (1..=WEEKS_IN_MONTH).map(|week| format!("Week {week}")).collect()
            }
            BucketScheme::MonthOfYear => {
                MONTH_LABELS.iter().map(|l| l.to_string()).collect()
            }
            BucketScheme::ObservedDays(days) => {
                days.iter().map(|day| iso_label(*day)).collect()
            }
            BucketScheme::DayRange { first, days } => (0..*days)
                .map(|offset| iso_label(*first + Days::new(offset.into())))
                .collect(),
        }
    }

    /// Native key the store must group by to feed this scheme.
    pub fn group_key_spec(&self) -> GroupKeySpec {
        match self {
            BucketScheme::HourOfDay => GroupKeySpec::HourOfDay,
            BucketScheme::DayOfWeek => GroupKeySpec::DayOfWeek,
            BucketScheme::WeekOfMonth => GroupKeySpec::DayOfMonth,
            BucketScheme::MonthOfYear => GroupKeySpec::MonthOfYear,
            BucketScheme::ObservedDays(_) | BucketScheme::DayRange { .. } => {
                GroupKeySpec::CalendarDay
            }
        }
    }

    /// Converts a native store key into a 0-based bucket index.
    ///
    /// Weekday and month keys arrive 1-based, day-of-month keys fold into
    /// `ceil(day / 7) - 1`. Returns `None` for keys outside the scheme's
    /// range and for keys of the wrong kind.
    pub fn index_for_key(&self, key: &GroupKey) -> Option<usize> {
        match (self, key) {
            (BucketScheme::HourOfDay, GroupKey::Hour(hour)) => {
                let hour = *hour as usize;
                (hour < HOURS_IN_DAY).then_some(hour)
            }
            (BucketScheme::DayOfWeek, GroupKey::Weekday(day)) => {
                one_based(*day, WEEKDAY_LABELS.len())
            }
            (BucketScheme::WeekOfMonth, GroupKey::DayOfMonth(day)) => {
                one_based(*day, 31).map(|day0| day0 / 7)
            }
            (BucketScheme::MonthOfYear, GroupKey::Month(month)) => {
                one_based(*month, MONTH_LABELS.len())
            }
            (BucketScheme::ObservedDays(days), GroupKey::Date(date)) => {
                days.binary_search(date).ok()
            }
            (BucketScheme::DayRange { first, days }, GroupKey::Date(date)) => {
                let offset = (*date - *first).num_days();
                usize::try_from(offset)
                    .ok()
                    .filter(|offset| *offset < *days as usize)
            }
            _ => None,
        }
    }
}

fn one_based(value: u32, len: usize) -> Option<usize> {
    let value = value as usize;
    (1..=len).contains(&value).then(|| value - 1)
}

fn iso_label(day: NaiveDate) -> String { day.format("%Y-%m-%d").to_string() }

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, TimeZone};

    use super::*;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    impl BucketScheme {
        fn index_of(&self, local: DateTime<FixedOffset>) -> Option<usize> {
            GroupKey::for_timestamp(self.group_key_spec(), local)
                .and_then(|key| self.index_for_key(&key))
        }
    }

    #[test]
    fn test_fixed_scheme_label_counts() {
        for (filter, count) in [
            (Filter::Today, 24),
            (Filter::Week, 7),
            (Filter::Month, 5),
            (Filter::Year, 12),
        ] {
            let scheme = BucketScheme::for_filter(filter);
            assert_eq!(scheme.count(), count);
            assert_eq!(scheme.labels().len(), count);
        }
    }

    #[test]
    fn test_labels_are_in_display_order() {
        let hours = BucketScheme::HourOfDay.labels();
        assert_eq!(hours.first().map(String::as_str), Some("0:00"));
        assert_eq!(hours.last().map(String::as_str), Some("23:00"));
        assert_eq!(BucketScheme::DayOfWeek.labels()[0], "Sun");
        assert_eq!(BucketScheme::WeekOfMonth.labels()[4], "Week 5");
        assert_eq!(BucketScheme::MonthOfYear.labels()[11], "Dec");
    }

    #[test]
    fn test_hour_boundaries() {
        let scheme = BucketScheme::HourOfDay;
        assert_eq!(scheme.index_of(local(2024, 3, 14, 0, 0, 0)), Some(0));
        assert_eq!(scheme.index_of(local(2024, 3, 14, 23, 59, 59)), Some(23));
        assert_eq!(scheme.index_for_key(&GroupKey::Hour(24)), None);
    }

    #[test]
    fn test_weekday_conversion_from_one_based() {
        let scheme = BucketScheme::DayOfWeek;
        assert_eq!(scheme.index_for_key(&GroupKey::Weekday(1)), Some(0));
        assert_eq!(scheme.index_for_key(&GroupKey::Weekday(7)), Some(6));
        assert_eq!(scheme.index_for_key(&GroupKey::Weekday(0)), None);
        assert_eq!(scheme.index_for_key(&GroupKey::Weekday(8)), None);
        // 2024-03-10 is a Sunday, 2024-03-16 a Saturday
        assert_eq!(scheme.index_of(local(2024, 3, 10, 12, 0, 0)), Some(0));
        assert_eq!(scheme.index_of(local(2024, 3, 16, 12, 0, 0)), Some(6));
    }

    #[test]
    fn test_month_conversion_from_one_based() {
        let scheme = BucketScheme::MonthOfYear;
        assert_eq!(scheme.index_for_key(&GroupKey::Month(1)), Some(0));
        assert_eq!(scheme.index_for_key(&GroupKey::Month(12)), Some(11));
        assert_eq!(scheme.index_for_key(&GroupKey::Month(13)), None);
        assert_eq!(scheme.index_of(local(2024, 12, 31, 23, 0, 0)), Some(11));
    }

    #[test]
    fn test_week_of_month_folds_days() {
        let scheme = BucketScheme::WeekOfMonth;
        let week_of = |day| scheme.index_for_key(&GroupKey::DayOfMonth(day));

        assert_eq!(week_of(1), Some(0));
        assert_eq!(week_of(7), Some(0));
        assert_eq!(week_of(8), Some(1));
        assert_eq!(week_of(28), Some(3));
        assert_eq!(week_of(29), Some(4));
        assert_eq!(week_of(31), Some(4));
        assert_eq!(week_of(0), None);
        assert_eq!(week_of(32), None);
    }

    #[test]
    fn test_mismatched_key_kind_is_rejected() {
        assert_eq!(BucketScheme::HourOfDay.index_for_key(&GroupKey::Month(3)), None);
        assert_eq!(
            BucketScheme::MonthOfYear.index_for_key(&GroupKey::Dimension("x".into())),
            None
        );
    }

    #[test]
    fn test_observed_days_sorted_and_distinct() {
        let scheme = BucketScheme::observed([
            date(2024, 3, 3),
            date(2024, 3, 1),
            date(2024, 3, 3),
        ]);

        assert_eq!(scheme.labels(), vec!["2024-03-01", "2024-03-03"]);
        assert_eq!(scheme.index_for_key(&GroupKey::Date(date(2024, 3, 3))), Some(1));
        assert_eq!(scheme.index_for_key(&GroupKey::Date(date(2024, 3, 2))), None);
        assert_eq!(BucketScheme::for_filter(Filter::Custom).count(), 0);
    }

    #[test]
    fn test_day_range_is_dense() {
        let scheme = BucketScheme::DayRange {
            first: date(2024, 2, 27),
            days: 4,
        };

        assert_eq!(
            scheme.labels(),
            vec!["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01"]
        );
        assert_eq!(scheme.index_for_key(&GroupKey::Date(date(2024, 3, 1))), Some(3));
        assert_eq!(scheme.index_for_key(&GroupKey::Date(date(2024, 3, 2))), None);
        assert_eq!(scheme.index_for_key(&GroupKey::Date(date(2024, 2, 26))), None);
    }
}
