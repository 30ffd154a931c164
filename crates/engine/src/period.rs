//! Named periods and the closed date ranges they resolve to.

use crate::EngineError;
use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

pub const DEFAULT_LAST_MONTHS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    Today,
    ThisWeek,
    ThisMonth,
    LastMonths(u32),
    ThisYear,
    AllTime,
}

impl Period {
    pub fn last_months() -> Self {
        Period::LastMonths(DEFAULT_LAST_MONTHS)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Today => f.write_str("today"),
            Period::ThisWeek => f.write_str("this-week"),
            Period::ThisMonth => f.write_str("this-month"),
            Period::LastMonths(n) => write!(f, "last-{n}-months"),
            Period::ThisYear => f.write_str("this-year"),
            Period::AllTime => f.write_str("all-time"),
        }
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Period::Today),
            "this-week" => Ok(Period::ThisWeek),
            "this-month" => Ok(Period::ThisMonth),
            "this-year" => Ok(Period::ThisYear),
            "all-time" => Ok(Period::AllTime),
            other => other
                .strip_prefix("last-")
                .and_then(|rest| rest.strip_suffix("-months"))
                .and_then(|n| n.parse::<u32>().ok())
                .map(Period::LastMonths)
                .ok_or_else(|| EngineError::InvalidPeriod(s.to_string())),
        }
    }
}

impl TryFrom<String> for Period {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

/// Closed interval: both `start` and `end` are inside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// A range whose start lies after its end matches nothing.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// Resolves `period` to `[start, now]`. `week_start` is the locale's first day of the week.
pub fn resolve(period: Period, now: NaiveDateTime, week_start: Weekday) -> DateRange {
    let today = now.date();
    let start = match period {
        Period::Today => today,
        Period::ThisWeek => {
            let back = (7 + today.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
            today
                .checked_sub_days(Days::new(u64::from(back)))
                .unwrap_or(NaiveDate::MIN)
        }
        Period::ThisMonth => today.with_day(1).unwrap_or(today),
        Period::LastMonths(n) => today
            .checked_sub_months(Months::new(n))
            .unwrap_or(NaiveDate::MIN),
        Period::ThisYear => today.with_ordinal(1).unwrap_or(today),
        Period::AllTime => return DateRange::new(NaiveDateTime::MIN, now),
    };
    DateRange::new(midnight(start), now)
}

/// Source of "now" for period resolution.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock local time.
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: NaiveDateTime) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
