//! Calendar-date helpers shared by both data sources.

use crate::error::{DataError, Result};
use chrono::{Days, NaiveDate};
use std::fmt;

/// Wire format used by J-Quants and by every uid we emit.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string into a calendar date.
///
/// No timezone is involved: the returned date is exactly the day written.
pub fn parse_market_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Format a date the way the API and the uids expect it.
pub fn format_market_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day of the range.
    pub from: NaiveDate,
    /// Last day of the range.
    pub to: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(DataError::InvalidDateRange {
                start: format_market_date(from),
                end: format_market_date(to),
            });
        }
        Ok(Self { from, to })
    }

    /// Range starting at `from` and spanning `days` days forward.
    ///
    /// # Errors
    ///
    /// Returns an error if the end date falls outside chrono's calendar.
    pub fn forward(from: NaiveDate, days: u32) -> Result<Self> {
        let to = from
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| DataError::DateOutOfRange {
                start: format_market_date(from),
                days,
            })?;
        Ok(Self { from, to })
    }

    /// `from` formatted for query parameters.
    pub fn from_param(&self) -> String {
        format_market_date(self.from)
    }

    /// `to` formatted for query parameters.
    pub fn to_param(&self) -> String {
        format_market_date(self.to)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.from_param(), self.to_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-01-01", 2024, 1, 1)]
    #[case("2024-02-29", 2024, 2, 29)]
    #[case("1999-12-31", 1999, 12, 31)]
    #[case(" 2025-03-31 ", 2025, 3, 31)]
    fn test_parse_market_date_keeps_the_day(
        #[case] input: &str,
        #[case] y: i32,
        #[case] m: u32,
        #[case] d: u32,
    ) {
        let date = parse_market_date(input).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(format_market_date(date), input.trim());
    }

    #[rstest]
    #[case("invalid-date")]
    #[case("")]
    #[case("2024/01/01")]
    #[case("2023-02-29")]
    fn test_parse_market_date_rejects(#[case] input: &str) {
        assert!(parse_market_date(input).is_none());
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(matches!(
            DateRange::new(a, b),
            Err(DataError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_forward_range() {
        let start = parse_market_date("2024-01-01").unwrap();
        let range = DateRange::forward(start, 365).unwrap();
        assert_eq!(range.to_param(), "2024-12-31");
        assert_eq!(range.to_string(), "2024-01-01 ~ 2024-12-31");
    }

    #[rstest]
    #[case(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 0, Some("2024-01-01"))]
    #[case(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(), 1, Some("2024-02-29"))]
    #[case(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), u32::MAX, None)]
    #[case(NaiveDate::MAX, 1, None)]
    fn test_forward_overflow_is_an_error(
        #[case] start: NaiveDate,
        #[case] days: u32,
        #[case] expected_to: Option<&str>,
    ) {
        match (DateRange::forward(start, days), expected_to) {
            (Ok(range), Some(to)) => assert_eq!(range.to_param(), to),
            (Err(DataError::DateOutOfRange { days: d, .. }), None) => assert_eq!(d, days),
            (other, _) => panic!("unexpected result: {other:?}"),
        }
    }
}
