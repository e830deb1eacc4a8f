use crate::types::datetime::{from_epoch, parse_datetime};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Converts a raw time value to UTC. Numbers are epoch seconds, or epoch
/// milliseconds above `1e12`; strings are ISO-8601, naive meaning UTC.
pub(crate) fn to_utc(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => number.as_f64().and_then(from_epoch),
        Value::String(text) => parse_datetime(text),
        _ => None,
    }
}

/// Admits finite numbers, and strings that parse to one after trimming.
pub(crate) fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}
