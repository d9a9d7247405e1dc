//! Local calendar for day bucketing
//!
//! Every component that needs the calendar day of a record goes through
//! [`LocalCalendar::local_date`]. Records are stored as UTC instants and the
//! day is read from the wall clock of one reference offset, never from the
//! UTC date, so a 21:30 milking in UTC-5 stays on the day it was entered.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::error::{MilkError, MilkResult};

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Reference timezone used for every local-date derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCalendar {
    offset: FixedOffset,
}

impl LocalCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Calendar anchored at UTC
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Build a calendar from text such as `-05:00`, `+0530`, `Z` or `UTC`
    pub fn from_offset_str(raw: &str) -> MilkResult<Self> {
        Self::parse_offset(raw).map(Self::new)
    }

    pub fn parse_offset(raw: &str) -> MilkResult<FixedOffset> {
        let text = raw.trim();
        if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
            return Ok(Utc.fix());
        }
        text.parse::<FixedOffset>()
            .map_err(|_| MilkError::InvalidUtcOffset(raw.to_string()))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day of an instant on the reference wall clock
    pub fn local_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Today on the reference wall clock
    pub fn today(&self, clock: &dyn Clock) -> NaiveDate {
        self.local_date(&clock.now())
    }

    /// Wall-clock time of day of an instant
    pub fn local_time(&self, instant: &DateTime<Utc>) -> NaiveTime {
        instant.with_timezone(&self.offset).time()
    }

    /// UTC instant for a wall-clock `date` + `time` in the reference zone
    pub fn at_local(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

impl Default for LocalCalendar {
    fn default() -> Self {
        Self::utc()
    }
}
