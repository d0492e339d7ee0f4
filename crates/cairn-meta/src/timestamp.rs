//! UTC timestamps as stored in metadata documents.
//!
//! Timestamps are truncated to microseconds so that a value written to disk
//! and read back compares equal to the in-memory one.

use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Utc};
use serde_json::Value;

/// Current time, truncated to microseconds.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(now)
}

/// `now()`, but strictly after `previous` when one is given.
pub fn after(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = now();
    match previous {
        Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
        _ => now,
    }
}

/// RFC 3339 text with microsecond precision and a `Z` suffix.
pub fn to_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Parse a stored timestamp. Anything that is not RFC 3339 text is `None`.
pub fn from_value(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_roundtrip_is_exact() {
        let ts = now();
        assert_eq!(from_value(&to_value(ts)), Some(ts));
    }

    #[test]
    fn after_is_strictly_later() {
        let far_future = now() + TimeDelta::days(1);
        assert!(after(Some(far_future)) > far_future);
        let past = now() - TimeDelta::days(1);
        assert!(after(Some(past)) > past);
    }

    #[test]
    fn non_strings_do_not_parse() {
        assert_eq!(from_value(&Value::from(12)), None);
        assert_eq!(from_value(&Value::from("yesterday")), None);
    }
}
