//! Time keys used to join series into one table.
//!
//! Two representations are used for a point's timestamp:
//!
//! - [`TimeKey`]: epoch milliseconds, the row key of a merged table.
//! - [`bucket_key`]: an ISO-8601 string with millisecond precision, the key
//!   of a derived-series cache.

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp of a data point.
pub type Time = DateTime<Utc>;

/// Row key of a merged table: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeKey(i64);

impl TimeKey {
    /// Creates a key from epoch milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the epoch milliseconds.
    pub fn millis(&self) -> i64 {
        self.0
    }

    /// Converts the key back to a timestamp.
    ///
    /// Every key produced from a [`Time`] converts back losslessly at
    /// millisecond precision; out-of-range keys clamp to the epoch.
    pub fn to_time(&self) -> Time {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl From<Time> for TimeKey {
    fn from(time: Time) -> Self {
        Self(time.timestamp_millis())
    }
}

impl From<&Time> for TimeKey {
    fn from(time: &Time) -> Self {
        Self(time.timestamp_millis())
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cache key of a derived-series bucket: `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn bucket_key(time: &Time) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
