use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};

use super::CategoryId;

/// A caller-supplied value that is not one of the accepted forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArgument(pub String);

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidArgument {}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, InvalidArgument> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        InvalidArgument(format!(
            "Invalid date '{}'. Expected YYYY-MM-DD.",
            input.trim()
        ))
    })
}

/// Inclusive date bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Narrow this range by another one.
    pub fn intersect(self, other: DateRange) -> DateRange {
        DateRange {
            from: max_opt(self.from, other.from),
            to: min_opt(self.to, other.to),
        }
    }
}

fn max_opt(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn min_opt(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Relative date presets for listing expenses and incomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    Yesterday,
    Last7Days,
    Last15Days,
    Last30Days,
    Last90Days,
    Last365Days,
}

impl DateFilter {
    pub const ALL: [DateFilter; 7] = [
        DateFilter::Today,
        DateFilter::Yesterday,
        DateFilter::Last7Days,
        DateFilter::Last15Days,
        DateFilter::Last30Days,
        DateFilter::Last90Days,
        DateFilter::Last365Days,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::Today => "today",
            DateFilter::Yesterday => "yesterday",
            DateFilter::Last7Days => "last_7_days",
            DateFilter::Last15Days => "last_15_days",
            DateFilter::Last30Days => "last_30_days",
            DateFilter::Last90Days => "last_90_days",
            DateFilter::Last365Days => "last_365_days",
        }
    }

    /// Resolve the preset against the current day.
    pub fn range(&self, today: NaiveDate) -> DateRange {
        let since = |days: i64| DateRange {
            from: Some(today - Duration::days(days)),
            to: None,
        };
        match self {
            DateFilter::Today => DateRange {
                from: Some(today),
                to: Some(today),
            },
            DateFilter::Yesterday => {
                let yesterday = today - Duration::days(1);
                DateRange {
                    from: Some(yesterday),
                    to: Some(yesterday),
                }
            }
            DateFilter::Last7Days => since(7),
            DateFilter::Last15Days => since(15),
            DateFilter::Last30Days => since(30),
            DateFilter::Last90Days => since(90),
            DateFilter::Last365Days => since(365),
        }
    }
}

impl FromStr for DateFilter {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateFilter::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = DateFilter::ALL.iter().map(|f| f.as_str()).collect();
                InvalidArgument(format!(
                    "Invalid date_filter value '{}'. Valid options are {}.",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Filters for listing expenses or incomes. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<CategoryId>,
    pub date_filter: Option<DateFilter>,
}

impl MovementFilter {
    /// Combined date bounds of the explicit dates and the preset.
    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        let explicit = DateRange {
            from: self.start_date,
            to: self.end_date,
        };
        match self.date_filter {
            Some(preset) => explicit.intersect(preset.range(today)),
            None => explicit,
        }
    }
}

/// A calendar year, optionally narrowed to one month, as a half-open date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: Option<u32>,
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(year: i32, month: Option<u32>) -> Result<Self, InvalidArgument> {
        let invalid = || {
            InvalidArgument(match month {
                Some(m) => format!("Invalid period {}-{}", year, m),
                None => format!("Invalid year {}", year),
            })
        };

        let (start, end) = match month {
            Some(m) => {
                if !(1..=12).contains(&m) {
                    return Err(InvalidArgument(format!(
                        "Invalid month {}. Expected 1-12.",
                        m
                    )));
                }
                let start = NaiveDate::from_ymd_opt(year, m, 1).ok_or_else(invalid)?;
                let end = if m == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(year, m + 1, 1)
                }
                .ok_or_else(invalid)?;
                (start, end)
            }
            None => {
                let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
                let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(invalid)?;
                (start, end)
            }
        };

        Ok(Self {
            year,
            month,
            start,
            end,
        })
    }

    /// First day inside the period.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day after the period.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-05-01"), Ok(d(2024, 5, 1)));
        assert!(parse_date("01/05/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_date_filter_parsing() {
        for preset in DateFilter::ALL {
            assert_eq!(preset.as_str().parse::<DateFilter>(), Ok(preset));
        }
        let err = "last_week".parse::<DateFilter>().unwrap_err();
        assert!(err.0.contains("last_7_days"));
    }

    #[test]
    fn test_date_filter_ranges() {
        let today = d(2024, 3, 1);
        assert_eq!(
            DateFilter::Yesterday.range(today),
            DateRange {
                from: Some(d(2024, 2, 29)),
                to: Some(d(2024, 2, 29))
            }
        );
        assert_eq!(DateFilter::Last7Days.range(today).from, Some(d(2024, 2, 23)));
        assert_eq!(DateFilter::Last7Days.range(today).to, None);
    }

    #[test]
    fn test_filter_combines_explicit_dates_with_preset() {
        let filter = MovementFilter {
            start_date: Some(d(2024, 2, 1)),
            end_date: Some(d(2024, 2, 25)),
            date_filter: Some(DateFilter::Last7Days),
            ..Default::default()
        };
        let range = filter.date_range(d(2024, 3, 1));
        assert_eq!(range.from, Some(d(2024, 2, 23)));
        assert_eq!(range.to, Some(d(2024, 2, 25)));
    }

    #[test]
    fn test_period_month_bounds() {
        let may = Period::new(2024, Some(5)).unwrap();
        assert_eq!(may.start(), d(2024, 5, 1));
        assert_eq!(may.end(), d(2024, 6, 1));
        assert!(may.contains(d(2024, 5, 31)));
        assert!(!may.contains(d(2024, 6, 1)));

        let december = Period::new(2023, Some(12)).unwrap();
        assert_eq!(december.end(), d(2024, 1, 1));
    }

    #[test]
    fn test_period_year_only() {
        let year = Period::new(2024, None).unwrap();
        assert_eq!(year.start(), d(2024, 1, 1));
        assert_eq!(year.end(), d(2025, 1, 1));
    }

    #[test]
    fn test_period_rejects_bad_month() {
        assert!(Period::new(2024, Some(0)).is_err());
        assert!(Period::new(2024, Some(13)).is_err());
    }
}
