//! Timestamp parsing for stored rows.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Format used by SQLite's `CURRENT_TIMESTAMP` (UTC).
pub const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a stored timestamp.
///
/// Rows written by this crate carry `CURRENT_TIMESTAMP` values; RFC3339 is
/// accepted as well for data imported from elsewhere. Unparseable values
/// fall back to the epoch rather than failing the whole row read.
#[must_use]
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, SQL_DATETIME_FORMAT) {
        return Utc.from_utc_datetime(&naive);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }

    DateTime::<Utc>::UNIX_EPOCH
}
