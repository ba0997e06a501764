// src/util/time.rs
use chrono::{DateTime, SecondsFormat, Utc};

/// Render a timestamp in the fixed-width form used both for storage and for
/// cursor sort values, so that string order equals chronological order.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use conveyor_filters::util::time::timestamp_key;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
/// assert_eq!(timestamp_key(&ts), "2024-03-01T12:00:00.000Z");
/// ```
pub fn timestamp_key(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Current time truncated to the precision of [`timestamp_key`].
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    parse_timestamp(&timestamp_key(&now)).unwrap_or(now)
}
