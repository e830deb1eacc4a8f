//! Datetime parsing and rendering shared by the normalizer, the slice request
//! parser and every serialized row.
//!
//! All instants are carried as `DateTime<Utc>` and rendered as ISO-8601 with an
//! explicit `+00:00` offset, so the rendered strings sort lexically in
//! chronological order.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 style datetime string into UTC.
///
/// A trailing `Z` is read as `+00:00`. Values without an offset (including a
/// bare `YYYY-MM-DD`, which means midnight) are assumed to already be UTC.
///
/// ```
/// use station_series::parse_datetime;
///
/// let a = parse_datetime("2024-05-01T12:00:00Z").unwrap();
/// let b = parse_datetime("2024-05-01T14:00:00+02:00").unwrap();
/// let c = parse_datetime("2024-05-01 12:00").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a, c);
/// assert!(parse_datetime("yesterday").is_none());
/// ```
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    let owned;
    let value = match trimmed.strip_suffix('Z') {
        Some(head) => {
            owned = format!("{head}+00:00");
            owned.as_str()
        }
        None => trimmed,
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Converts an epoch number to UTC. Values above `1e12` are milliseconds,
/// anything else is seconds.
pub fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value > 1e12 {
        value.trunc()
    } else {
        (value * 1000.0).trunc()
    };
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Renders an instant as ISO-8601 with an explicit UTC offset, e.g.
/// `2024-05-01T12:00:00+00:00`.
pub fn format_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Serde adapter for `DateTime<Utc>` fields rendered with [`format_iso`].
pub(crate) mod iso_utc {
    use super::{format_iso, parse_datetime};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_datetime(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp '{raw}'")))
    }
}

/// Same as [`iso_utc`] for optional fields.
pub(crate) mod iso_utc_opt {
    use super::{format_iso, parse_datetime};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_some(&format_iso(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_datetime(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp '{raw}'"))),
            None => Ok(None),
        }
    }
}
