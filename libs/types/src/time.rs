//! Ledger timestamps
//!
//! Time is whatever the execution environment stamps on a call, in whole
//! seconds since the Unix epoch. Nothing here reads a wall clock.

use chrono::{DateTime, Utc};

/// Seconds since the Unix epoch, as supplied with each call.
pub type Timestamp = i64;

/// A window that started at `now` and lasts `period_seconds` has lapsed once
/// the current time reaches its end.
pub fn is_lapsed(now: Timestamp, ends_at: Timestamp) -> bool {
    now >= ends_at
}

/// End of a window opened at `now`, or `None` on overflow.
pub fn window_end(now: Timestamp, period_seconds: i64) -> Option<Timestamp> {
    now.checked_add(period_seconds)
}

/// Convert to a UTC datetime, if in chrono's range.
pub fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

/// RFC 3339 rendering for logs; falls back to the raw seconds.
pub fn format_timestamp(ts: Timestamp) -> String {
    to_datetime(ts)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
