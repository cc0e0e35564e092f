//! Timestamp normalization
//!
//! Exports encode creation times as ISO-8601 strings, Unix seconds, Unix
//! milliseconds, or not at all. Everything folds into one canonical
//! epoch-ms integer. Unusable values take the supplied fallback instead of
//! failing, which keeps downstream sorting total; the cost is that a bad
//! field can misplace that one message in the ordering. That trade-off is
//! deliberate, not an oversight.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Numbers below this read as Unix seconds rather than milliseconds.
const EPOCH_MS_THRESHOLD: f64 = 1_000_000_000_000.0;

/// Normalize a raw `create_time` value to epoch milliseconds.
///
/// Total over any JSON value:
/// - absent/null → `fallback_ms`
/// - string → parsed as a date, `fallback_ms` when unparseable
/// - number below [`EPOCH_MS_THRESHOLD`] → treated as seconds, scaled ×1000
/// - number at or above the threshold → already milliseconds, used as-is
/// - anything else → `fallback_ms`
pub fn normalize_epoch_ms(raw: Option<&Value>, fallback_ms: i64) -> i64 {
    match raw {
        None | Some(Value::Null) => fallback_ms,
        Some(Value::String(s)) => parse_datetime_str(s).unwrap_or(fallback_ms),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => {
                if v < EPOCH_MS_THRESHOLD {
                    (v * 1000.0) as i64
                } else {
                    v as i64
                }
            }
            _ => fallback_ms,
        },
        Some(_) => fallback_ms,
    }
}

/// Normalize a raw `create_time` value, defaulting to the current time.
///
/// Callers processing many nodes should capture one fallback via
/// [`chrono::Utc::now`] and use [`normalize_epoch_ms`] directly so that
/// nodes without timestamps tie instead of drifting apart.
pub fn normalize_timestamp(raw: Option<&Value>) -> i64 {
    normalize_epoch_ms(raw, Utc::now().timestamp_millis())
}

fn parse_datetime_str(s: &str) -> Option<i64> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }

    // Naive "YYYY-MM-DDTHH:MM:SS[.fff]" and space-separated variants
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FALLBACK: i64 = 42;

    #[test]
    fn seconds_scale_to_milliseconds() {
        assert_eq!(
            normalize_epoch_ms(Some(&json!(1_700_000_000)), FALLBACK),
            1_700_000_000_000
        );
    }

    #[test]
    fn milliseconds_pass_through() {
        assert_eq!(
            normalize_epoch_ms(Some(&json!(1_700_000_000_000i64)), FALLBACK),
            1_700_000_000_000
        );
    }

    #[test]
    fn fractional_seconds_keep_sub_second_precision() {
        assert_eq!(
            normalize_epoch_ms(Some(&json!(1_700_000_000.5)), FALLBACK),
            1_700_000_000_500
        );
    }

    #[test]
    fn iso_strings_parse() {
        assert_eq!(
            normalize_epoch_ms(Some(&json!("2023-11-14T22:13:20.000Z")), FALLBACK),
            1_700_000_000_000
        );
        assert_eq!(
            normalize_epoch_ms(Some(&json!("2023-11-14T22:13:20+00:00")), FALLBACK),
            1_700_000_000_000
        );
    }

    #[test]
    fn unparseable_values_take_the_fallback() {
        assert_eq!(normalize_epoch_ms(None, FALLBACK), FALLBACK);
        assert_eq!(normalize_epoch_ms(Some(&Value::Null), FALLBACK), FALLBACK);
        assert_eq!(
            normalize_epoch_ms(Some(&json!("not a date")), FALLBACK),
            FALLBACK
        );
        assert_eq!(normalize_epoch_ms(Some(&json!(true)), FALLBACK), FALLBACK);
        assert_eq!(
            normalize_epoch_ms(Some(&json!({"t": 1})), FALLBACK),
            FALLBACK
        );
    }

    #[test]
    fn missing_timestamp_defaults_to_now() {
        let start = Utc::now().timestamp_millis();
        let normalized = normalize_timestamp(None);
        assert!(normalized >= start);
    }
}
