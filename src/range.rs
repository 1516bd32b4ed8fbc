//! Reporting date ranges.
//!
//! The batch store never does date arithmetic: callers compute and clamp a [`DateRange`] first,
//! typically with [`DateRange::for_query_date`].

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar date range a batch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range as given. No ordering check is made here.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> IngestionResult<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// Range reported for a query made on `date`: from the first day of its month up to the
    /// previous day, never ending before it starts.
    pub fn for_query_date(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = date
            .checked_sub_days(Days::new(1))
            .map_or(start, |d| d.max(start));
        Self::new(start, end)
    }

    /// Like [`Self::for_query_date`], for an optional `YYYY-MM-DD` query string.
    ///
    /// Missing, blank or unparseable input falls back to `today`.
    pub fn for_query_str(raw: Option<&str>, today: NaiveDate) -> Self {
        let date = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
            .unwrap_or(today);
        Self::for_query_date(date)
    }
}

fn parse_date(raw: &str) -> IngestionResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| IngestionError::InvalidDate {
        raw: raw.to_owned(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn query_range_ends_the_day_before() {
        let r = DateRange::for_query_date(d(2024, 5, 10));
        assert_eq!(r, DateRange::new(d(2024, 5, 1), d(2024, 5, 9)));
    }

    #[test]
    fn query_on_first_of_month_clamps_end() {
        let r = DateRange::for_query_date(d(2024, 3, 1));
        assert_eq!(r.start, d(2024, 3, 1));
        assert_eq!(r.end, d(2024, 3, 1));
    }

    #[test]
    fn query_string_falls_back_to_today() {
        let today = d(2024, 6, 15);
        assert_eq!(DateRange::for_query_str(None, today).end, d(2024, 6, 14));
        assert_eq!(DateRange::for_query_str(Some("  "), today).end, d(2024, 6, 14));
        assert_eq!(DateRange::for_query_str(Some("junk"), today).end, d(2024, 6, 14));
        assert_eq!(DateRange::for_query_str(Some("2024-02-20"), today).start, d(2024, 2, 1));
    }

    #[test]
    fn parse_rejects_malformed_dates() {
        assert!(DateRange::parse("2024-05-01", "2024-05-10").is_ok());
        let err = DateRange::parse("2024-13-01", "2024-05-10").unwrap_err();
        assert!(err.to_string().contains("invalid date '2024-13-01'"));
    }
}
