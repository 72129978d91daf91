// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local calendar week windows expressed as UTC instant ranges.
//!
//! Local time is derived from a fixed offset in minutes rather than a named
//! time zone, so week boundaries never shift for daylight saving time.

use crate::error::ReportError;
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, Utc};
use std::{fmt, str::FromStr};

/// Format used for local wall-clock timestamps handed back to callers.
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Earliest and latest offsets in use by real-world zones (UTC-12:00, UTC+14:00).
const MIN_OFFSET_MINUTES: i32 = -12 * 60;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// A fixed offset from UTC in minutes. Negative values are west of Greenwich.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UtcOffset(i32);

impl UtcOffset {
    pub const UTC: UtcOffset = UtcOffset(0);

    pub fn from_minutes(minutes: i32) -> Result<Self, ReportError> {
        if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return Err(ReportError::invalid(
                "UTC offset",
                format!(
                    "{} minutes is outside {}..={}",
                    minutes, MIN_OFFSET_MINUTES, MAX_OFFSET_MINUTES
                ),
            ));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(self) -> i32 {
        self.0
    }

    fn as_duration(self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

impl FromStr for UtcOffset {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s
            .trim()
            .parse::<i32>()
            .map_err(|e| ReportError::invalid("UTC offset", format!("'{}': {}", s, e)))?;
        Self::from_minutes(minutes)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let abs = self.0.unsigned_abs();
        write!(f, "UTC{}{:02}:{:02}", sign, abs / 60, abs % 60)
    }
}

/// One local Monday 00:00:00 to Sunday 23:59:59 week.
///
/// `start_utc..=end_utc` is the inclusive range used to select posts; the
/// local fields are what gets reported back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekWindow {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub local_start: NaiveDateTime,
    pub local_end: NaiveDateTime,
}

impl WeekWindow {
    pub fn week_start_label(&self) -> String {
        self.local_start.format(LOCAL_TIMESTAMP_FORMAT).to_string()
    }

    pub fn week_end_label(&self) -> String {
        self.local_end.format(LOCAL_TIMESTAMP_FORMAT).to_string()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start_utc <= instant && instant <= self.end_utc
    }
}

/// Compute the week `week_offset` weeks before the one containing `reference`.
///
/// A missing offset means the caller's local time is UTC.
pub fn compute_week(
    reference: DateTime<Utc>,
    utc_offset: Option<UtcOffset>,
    week_offset: u32,
) -> WeekWindow {
    let shift = utc_offset.unwrap_or(UtcOffset::UTC).as_duration();
    let local_now = reference.naive_utc() + shift;

    let days_from_monday = local_now.weekday().num_days_from_monday();
    let week_start_date = local_now.date()
        - Duration::days(i64::from(days_from_monday) + 7 * i64::from(week_offset));

    let local_start = week_start_date.and_time(NaiveTime::MIN);
    let local_end = local_start
        + Duration::days(6)
        + Duration::hours(23)
        + Duration::minutes(59)
        + Duration::seconds(59);

    WeekWindow {
        start_utc: (local_start - shift).and_utc(),
        end_utc: (local_end - shift).and_utc(),
        local_start,
        local_end,
    }
}

/// The trailing `days`-day range ending at `now`, inclusive on both ends.
pub fn trailing_days(now: DateTime<Utc>, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::days(days), now)
}
