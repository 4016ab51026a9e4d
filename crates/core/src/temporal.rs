//! Calendar values not covered by chrono
//!
//! chrono supplies instants, durations, local dates and times and offset
//! date-times. The types here fill the remaining gaps: zone identifiers,
//! zoned and offset-only times, partial dates and calendar periods.

use crate::error::{CoreError, Result};
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Region or offset based time-zone identifier, e.g. `Europe/London`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(String);

impl ZoneId {
    /// Validate and wrap a zone identifier
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = !id.is_empty()
            && !id.starts_with('/')
            && !id.ends_with('/')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '+' | ':'));
        if valid {
            Ok(ZoneId(id))
        } else {
            Err(CoreError::InvalidZone(id))
        }
    }

    /// UTC
    pub fn utc() -> Self {
        ZoneId("UTC".to_string())
    }

    /// Identifier text
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Date-time in a named zone, with the offset in force at that instant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZonedDateTime {
    /// Local wall-clock date-time
    pub local: NaiveDateTime,
    /// Offset from UTC at `local`
    pub offset: FixedOffset,
    /// Zone the value was expressed in
    pub zone: ZoneId,
}

/// Wall-clock time with a UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetTime {
    /// Local time
    pub time: NaiveTime,
    /// Offset from UTC
    pub offset: FixedOffset,
}

/// Largest offset accepted, in seconds (±18 hours)
pub const MAX_OFFSET_SECONDS: i32 = 18 * 3600;

/// Build a [`FixedOffset`] from seconds east of UTC
pub fn offset_from_seconds(seconds: i32) -> Result<FixedOffset> {
    if seconds.abs() > MAX_OFFSET_SECONDS {
        return Err(CoreError::InvalidTemporal {
            field: "offset",
            value: seconds.into(),
        });
    }
    FixedOffset::east_opt(seconds).ok_or(CoreError::InvalidTemporal {
        field: "offset",
        value: seconds.into(),
    })
}

/// A proleptic ISO year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Year(pub i32);

impl Year {
    /// True for leap years
    pub fn is_leap(&self) -> bool {
        NaiveDate::from_ymd_opt(self.0, 2, 29).is_some()
    }
}

/// A year and month, e.g. `2024-02`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Validate and build
    pub fn new(year: i32, month: u32) -> Result<Self> {
        check_month(month)?;
        Ok(YearMonth { year, month })
    }

    /// Year component
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month component, 1-12
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Number of days in this month
    pub fn length(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .map(|d| d.day())
            .unwrap_or(31)
    }
}

/// A month and day without a year, e.g. `--02-29`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Validate and build; February 29th is allowed
    pub fn new(month: u32, day: u32) -> Result<Self> {
        check_month(month)?;
        // 2000 is a leap year, so every month-day that can ever exist is valid in it
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(CoreError::InvalidTemporal {
                field: "day",
                value: day.into(),
            });
        }
        Ok(MonthDay { month, day })
    }

    /// Month component, 1-12
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Day of month
    pub fn day(&self) -> u32 {
        self.day
    }
}

/// A date-based amount of time: years, months and days
///
/// Components are independent and may be negative; `P1M` and `P30D` are
/// different periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Period {
    /// Years
    pub years: i32,
    /// Months
    pub months: i32,
    /// Days
    pub days: i32,
}

impl Period {
    /// Build a period
    pub fn new(years: i32, months: i32, days: i32) -> Self {
        Period {
            years,
            months,
            days,
        }
    }

    /// True if every component is zero
    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("P0D");
        }
        f.write_str("P")?;
        if self.years != 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months != 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        Ok(())
    }
}

fn check_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(CoreError::InvalidTemporal {
            field: "month",
            value: month.into(),
        })
    }
}
