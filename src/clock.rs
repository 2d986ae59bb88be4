//! Clock and calendar-day keys
//!
//! Daily quotas reset on calendar-day boundaries. The day is derived from the
//! server's clock in a single reference offset chosen by the operator, never
//! from a caller-supplied timestamp.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move the clock to a new instant
    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    /// Advance the clock by a duration
    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Calendar-day key used for quota resets (serialized as `YYYY-MM-DD`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Parse a stored `YYYY-MM-DD` key
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Largest offset any real time zone uses
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Maps instants to day keys in one reference offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPolicy {
    offset: FixedOffset,
}

impl DayPolicy {
    /// Days in UTC
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Days in a fixed offset east of UTC, in minutes
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return None;
        }
        FixedOffset::east_opt(minutes * 60).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day containing `now` in the reference offset
    pub fn day_key(&self, now: DateTime<Utc>) -> DayKey {
        DayKey(now.with_timezone(&self.offset).date_naive())
    }
}

impl Default for DayPolicy {
    fn default() -> Self {
        Self::utc()
    }
}
