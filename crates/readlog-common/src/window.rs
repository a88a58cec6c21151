// Calendar windows used by the analytics queries.
//
// All windows are inclusive on both ends and expressed in UTC. Month and year
// windows run from the first day at 00:00:00 to the last day at 23:59:59, and
// stored timestamps carry whole seconds only, so consecutive windows never
// overlap and never leave a gap.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days from `first` 00:00:00 through `last` 23:59:59.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        Self::new(start_of_day(first)?, end_of_day(last)?)
    }

    pub fn month(year: i32, month: u32) -> Result<Self> {
        let first = month_start(year, month)?;
        let (next_year, next_month) = shift_month(year, month, 1);
        let last = month_start(next_year, next_month)?
            .pred_opt()
            .ok_or_else(|| Error::InvalidInput(format!("No last day for {}-{}", year, month)))?;
        Self::days(first, last)
    }

    pub fn year(year: i32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| Error::InvalidInput(format!("Year out of range: {}", year)))?;
        let last = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| Error::InvalidInput(format!("Year out of range: {}", year)))?;
        Self::days(first, last)
    }

    /// The trailing `days` days up to and including `now`.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let end = whole_seconds(now);
        Self { start: end - Duration::days(i64::from(days)), end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Drops sub-second precision so that inclusive `23:59:59` bounds are exact.
pub fn whole_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0).unwrap_or(ts)
}

pub fn month_start(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidInput(format!("Invalid month: {}-{}", year, month)))
}

/// Moves `(year, month)` by `offset` months, crossing year boundaries.
pub fn shift_month(year: i32, month: u32, offset: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + offset;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Short display label such as `Jan 2024`.
pub fn month_label(year: i32, month: u32) -> Result<String> {
    Ok(month_start(year, month)?.format("%b %Y").to_string())
}

fn start_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    Ok(NaiveDateTime::new(date, NaiveTime::MIN).and_utc())
}

fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(23, 59, 59)
        .ok_or_else(|| Error::InvalidInput("Invalid end of day".to_string()))?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}
