//! Fixed-width resampling frequencies such as `"15min"`, `"1h"` or `"1d"`.

use crate::slice::error::SliceError;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A fixed bucket width parsed from a frequency descriptor.
///
/// A descriptor is an optional positive multiplier followed by a unit:
/// `s`/`S` (seconds), `min`/`T` (minutes), `h`/`H` (hours) or `d`/`D` (days).
///
/// Buckets are anchored at midnight UTC of the day holding the first point and
/// are closed on the left, so a bucket labelled `t` covers `[t, t + width)`.
///
/// # Examples
///
/// ```
/// use station_series::ResampleRule;
/// use chrono::TimeDelta;
///
/// let rule: ResampleRule = "15min".parse().unwrap();
/// assert_eq!(rule.width(), TimeDelta::minutes(15));
/// assert_eq!("H".parse::<ResampleRule>().unwrap().width(), TimeDelta::hours(1));
/// assert!("fortnightly".parse::<ResampleRule>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResampleRule {
    width_seconds: i64,
}

impl ResampleRule {
    pub fn width(&self) -> TimeDelta {
        TimeDelta::seconds(self.width_seconds)
    }

    /// Start of the resampling grid for a series whose first point is `first`.
    pub(crate) fn origin(first: DateTime<Utc>) -> DateTime<Utc> {
        first.date_naive().and_time(NaiveTime::MIN).and_utc()
    }

    /// Index of the bucket holding `t`, counted from `origin`.
    pub(crate) fn bucket_index(&self, origin: DateTime<Utc>, t: DateTime<Utc>) -> i64 {
        (t - origin)
            .num_milliseconds()
            .div_euclid(self.width_seconds * 1000)
    }

    /// Left edge of the bucket with the given index.
    pub(crate) fn bucket_start(&self, origin: DateTime<Utc>, index: i64) -> DateTime<Utc> {
        origin + TimeDelta::seconds(self.width_seconds * index)
    }
}

impl FromStr for ResampleRule {
    type Err = SliceError;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let invalid = || SliceError::InvalidResampleRule(descriptor.to_string());
        let trimmed = descriptor.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);

        let multiplier: i64 = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| invalid())?
        };
        if multiplier == 0 {
            return Err(invalid());
        }

        let unit_seconds = match unit {
            "s" | "S" => 1,
            "min" | "T" => 60,
            "h" | "H" => 3_600,
            "d" | "D" => 86_400,
            _ => return Err(invalid()),
        };

        let width_seconds = multiplier.checked_mul(unit_seconds).ok_or_else(invalid)?;
        // Keeps bucket arithmetic in milliseconds clear of overflow.
        if TimeDelta::try_seconds(width_seconds).is_none() {
            return Err(invalid());
        }
        Ok(Self { width_seconds })
    }
}

impl fmt::Display for ResampleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.width_seconds)
    }
}

/// Serialized as the width in seconds so `"60min"` and `"1h"` describe the same request.
impl Serialize for ResampleRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.width_seconds)
    }
}
