//! Common types used across the milk-collection pipeline

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{MilkError, MilkResult};

/// Inclusive calendar-day range for queries and reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> MilkResult<Self> {
        if start > end {
            return Err(MilkError::InvalidPeriod {
                from: start,
                to: end,
            });
        }
        Ok(Self { start, end })
    }

    /// A single-day range
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The `days` days before `today` up to and including `today`
    pub fn trailing_days(today: NaiveDate, days: u64) -> Self {
        let start = today.checked_sub_days(Days::new(days)).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Bucket size for period series in production reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportGranularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl ReportGranularity {
    /// First day of the bucket containing `date` (weeks start on Monday)
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            ReportGranularity::Daily => date,
            ReportGranularity::Weekly => {
                let back = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(back)).unwrap_or(date)
            }
            ReportGranularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        assert!(DateRange::new(d(2024, 3, 2), d(2024, 3, 1)).is_err());
        assert!(DateRange::new(d(2024, 3, 1), d(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_trailing_days_window() {
        let range = DateRange::trailing_days(d(2024, 3, 8), 7);
        assert_eq!(range.start, d(2024, 3, 1));
        assert_eq!(range.days(), 8);
        assert!(range.contains(d(2024, 3, 1)));
        assert!(!range.contains(d(2024, 2, 29)));
    }

    #[test]
    fn test_bucket_start() {
        // 2024-03-07 is a Thursday
        let date = d(2024, 3, 7);
        assert_eq!(ReportGranularity::Daily.bucket_start(date), date);
        assert_eq!(ReportGranularity::Weekly.bucket_start(date), d(2024, 3, 4));
        assert_eq!(ReportGranularity::Monthly.bucket_start(date), d(2024, 3, 1));
    }
}
