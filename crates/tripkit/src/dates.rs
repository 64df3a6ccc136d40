//! Calendar and time-of-day helpers.
//!
//! Days are stamped with a [`NaiveDate`]; there is no timezone in the planning
//! graph, a trip day is whatever the traveller's local calendar says.
//! Time-of-day values are [`ClockTime`], stored as minutes since midnight and
//! written as `"HH:MM"`.

use chrono::{Days, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Date of the day at `offset` positions after `start`.
///
/// Saturates at the calendar's upper bound instead of failing; a trip that far
/// out is nonsense but must not take the store down.
pub fn day_date(start: NaiveDate, offset: usize) -> NaiveDate {
    start
        .checked_add_days(Days::new(offset as u64))
        .unwrap_or(NaiveDate::MAX)
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// A time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self {
                minutes: (hour * 60 + minute) as u16,
            })
        } else {
            None
        }
    }

    /// Converts a minutes-since-midnight count. Values past midnight wrap
    /// into the next day (`1500` → `"01:00"`), negative values do not resolve.
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        if minutes < 0 {
            return None;
        }
        let wrapped = (minutes as u64 % MINUTES_PER_DAY as u64) as u16;
        Some(Self { minutes: wrapped })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes as u32
    }

    pub fn hour(&self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(&self) -> u32 {
        self.minutes() % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockParseError(pub String);

impl fmt::Display for ClockParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid clock time: {:?}", self.0)
    }
}

impl std::error::Error for ClockParseError {}

impl FromStr for ClockTime {
    type Err = ClockParseError;

    /// Accepts `H:MM`, `HH:MM` and `HH:MM:SS` (seconds are dropped).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ClockParseError(s.to_string());
        let mut parts = s.trim().split(':');
        let hour: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
        let minute_part = parts.next().ok_or_else(err)?;
        if minute_part.len() != 2 {
            return Err(err());
        }
        let minute: u32 = minute_part.parse().map_err(|_| err())?;
        if let Some(seconds) = parts.next() {
            let secs: u32 = seconds.parse().map_err(|_| err())?;
            if secs >= 60 {
                return Err(err());
            }
        }
        if parts.next().is_some() {
            return Err(err());
        }
        ClockTime::new(hour, minute).ok_or_else(err)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
