//! Time window requested from the monitoring provider on each run

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::warn;

pub const DEFAULT_LIMIT_MINUTES: i64 = 10;
pub const DEFAULT_SKIP_MINUTES: i64 = 0;

/// Width of the window (`limit`) counted backwards from `skip` minutes before now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionWindow {
    pub limit: i64,
    pub skip: i64,
}

impl Default for ExecutionWindow {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT_MINUTES,
            skip: DEFAULT_SKIP_MINUTES,
        }
    }
}

impl ExecutionWindow {
    pub fn new(limit: i64, skip: i64) -> Self {
        Self { limit, skip }
    }

    /// Build a window from optional query values.
    ///
    /// Missing or unparsable values use the defaults. A non-positive limit would
    /// give an empty window, so it is treated as unparsable too. `skip` is taken
    /// as given, negative values included. A window whose bounds cannot be
    /// represented as instants falls back to the default window.
    pub fn from_query(limit: Option<&str>, skip: Option<&str>) -> Self {
        let limit = limit
            .and_then(parse_leading_int)
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LIMIT_MINUTES);
        let skip = skip
            .and_then(parse_leading_int)
            .unwrap_or(DEFAULT_SKIP_MINUTES);

        let window = Self { limit, skip };
        if window.bounds().is_none() {
            warn!("window limit={limit} skip={skip} is out of range, using defaults");
            return Self::default();
        }

        window
    }

    /// Absolute `(start, end)` instants relative to `now`, if representable.
    pub fn range_at(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let end = now.checked_sub_signed(TimeDelta::try_minutes(self.skip)?)?;
        let start = end.checked_sub_signed(TimeDelta::try_minutes(self.limit)?)?;
        Some((start, end))
    }

    /// `(start, end)` in epoch seconds, rounded from milliseconds.
    pub fn bounds_at(&self, now: DateTime<Utc>) -> Option<(i64, i64)> {
        let (start, end) = self.range_at(now)?;
        Some((round_to_seconds(start), round_to_seconds(end)))
    }

    pub fn bounds(&self) -> Option<(i64, i64)> {
        self.bounds_at(Utc::now())
    }
}

fn round_to_seconds(instant: DateTime<Utc>) -> i64 {
    (instant.timestamp_millis() + 500).div_euclid(1000)
}

/// Parse the leading integer of a query value (`" 12abc"` is 12, `"abc"` is nothing).
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}
