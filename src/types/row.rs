use crate::types::datetime::iso_utc;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One output row: a timestamp followed by the selected columns in order.
///
/// A `None` value serializes as `null` and marks a column with no value at
/// this timestamp.
///
/// ```
/// use station_series::SeriesRow;
/// use chrono::{TimeZone, Utc};
///
/// let row = SeriesRow::new(
///     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     [("temp".to_string(), Some(4.5)), ("wind".to_string(), None)],
/// );
/// assert_eq!(
///     serde_json::to_string(&row).unwrap(),
///     r#"{"timestamp":"2024-01-01T00:00:00+00:00","temp":4.5,"wind":null}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    #[serde(with = "iso_utc")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: IndexMap<String, Option<f64>>,
}

impl SeriesRow {
    pub fn new(
        timestamp: DateTime<Utc>,
        values: impl IntoIterator<Item = (String, Option<f64>)>,
    ) -> Self {
        Self {
            timestamp,
            values: values.into_iter().collect(),
        }
    }

    /// The value of `column`, if the column exists and holds a value.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    /// Column names in output order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
