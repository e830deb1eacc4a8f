//! Conversion of raw upstream documents into a [`CanonicalSeries`].
//!
//! Malformed input never fails: unrecognized documents produce an empty
//! series, points without a usable timestamp are dropped and non-numeric
//! values are left out of `fields`.

pub(crate) mod shape;
mod values;

use crate::types::canonical::{CanonicalPoint, CanonicalSeries};
use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value};
use shape::{find_time_key, DocumentShape, DEFAULT_TIME_KEY};
use values::{to_number, to_utc};

/// Normalizes one raw upstream document.
///
/// Three layouts are understood: a row-wise `points` list, a columnar object
/// under `points`, and columns at the top level of the document. The result is
/// sorted ascending by timestamp.
///
/// # Examples
///
/// ```
/// use station_series::normalize;
/// use serde_json::json;
///
/// let series = normalize(&json!({
///     "points": [
///         {"time": "2024-01-01T01:00:00Z", "temp": "3.5", "note": "gusty"},
///         {"time": 1704067200, "temp": 2.0},
///         {"time": "garbage", "temp": 9.0},
///     ]
/// }));
///
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.points()[0].fields["temp"], 2.0);
/// assert_eq!(series.points()[1].fields["temp"], 3.5);
/// assert!(!series.points()[1].fields.contains_key("note"));
/// ```
pub fn normalize(document: &Value) -> CanonicalSeries {
    let points = match DocumentShape::detect(document) {
        Some(DocumentShape::RowWise(rows)) => row_wise_points(rows),
        Some(DocumentShape::PointsColumnar(columns))
        | Some(DocumentShape::TopLevelColumnar(columns)) => columnar_points(columns),
        None => {
            debug!("Unrecognized document shape, normalizing to an empty series");
            Vec::new()
        }
    };
    CanonicalSeries::from_unsorted(points)
}

fn row_wise_points(rows: &[Value]) -> Vec<CanonicalPoint> {
    let time_key = rows
        .first()
        .and_then(Value::as_object)
        .and_then(find_time_key)
        .unwrap_or(DEFAULT_TIME_KEY);

    let points: Vec<CanonicalPoint> = rows
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|row| {
            let timestamp = to_utc(row.get(time_key)?)?;
            let fields = row
                .iter()
                .filter(|(name, _)| is_field_name(name, time_key))
                .filter_map(|(name, value)| to_number(value).map(|n| (name.clone(), n)))
                .collect();
            Some(CanonicalPoint { timestamp, fields })
        })
        .collect();

    if points.len() < rows.len() {
        debug!(
            "Dropped {} of {} rows without a usable '{}' value",
            rows.len() - points.len(),
            rows.len(),
            time_key
        );
    }
    points
}

fn columnar_points(columns: &Map<String, Value>) -> Vec<CanonicalPoint> {
    let Some(time_key) = find_time_key(columns) else {
        debug!("Columnar document has no time column");
        return Vec::new();
    };
    let Some(times) = columns.get(time_key).and_then(Value::as_array) else {
        debug!("Time column '{}' is not an array", time_key);
        return Vec::new();
    };

    let value_columns: Vec<(&String, &Vec<Value>)> = columns
        .iter()
        .filter(|(name, _)| is_field_name(name, time_key))
        .filter_map(|(name, column)| column.as_array().map(|values| (name, values)))
        .collect();

    times
        .iter()
        .enumerate()
        .filter_map(|(index, time)| {
            let timestamp = to_utc(time)?;
            let fields: IndexMap<String, f64> = value_columns
                .iter()
                .filter_map(|(name, values)| {
                    let number = to_number(values.get(index)?)?;
                    Some(((*name).clone(), number))
                })
                .collect();
            Some(CanonicalPoint { timestamp, fields })
        })
        .collect()
}

/// The detected time key and the canonical `timestamp` name never become fields.
fn is_field_name(name: &str, time_key: &str) -> bool {
    name != time_key && name != DEFAULT_TIME_KEY
}
