use crate::normalize::normalize;
use crate::slice::resample::resample;
use crate::types::canonical::{CanonicalPoint, CanonicalSeries};
use crate::types::results::SliceResult;
use crate::types::row::SeriesRow;
use crate::types::slice_spec::SliceSpec;
use serde_json::Value;

/// Normalizes `document` and cuts the requested slice out of it.
///
/// Steps: time filter (inclusive bounds), variable projection in the caller's
/// order (unknown names are skipped), then optional resampling. Rows are
/// ascending by timestamp. Columns a row has no value for are `null`.
///
/// # Examples
///
/// ```
/// use station_series::{build_slice, SliceSpec};
/// use serde_json::json;
///
/// let document = json!({
///     "points": [
///         {"time": "2024-01-01T00:00:00Z", "a": 1, "b": 2, "c": 3},
///         {"time": "2024-01-01T01:00:00Z", "a": 4, "b": 5, "c": 6},
///     ]
/// });
/// let spec = SliceSpec::parse(
///     Some("2024-01-01T01:00:00Z"),
///     None,
///     Some(vec!["b".into(), "a".into(), "missing".into()]),
///     None,
/// )
/// .unwrap();
///
/// let slice = build_slice(&document, &spec);
/// assert_eq!(slice.points_count(), 1);
/// assert_eq!(slice.points()[0].columns().collect::<Vec<_>>(), ["b", "a"]);
/// ```
pub fn build_slice(document: &Value, spec: &SliceSpec) -> SliceResult {
    let series = normalize(document);
    if series.is_empty() {
        return SliceResult::empty();
    }

    let points: Vec<&CanonicalPoint> = series
        .iter()
        .filter(|point| spec.contains(point.timestamp))
        .collect();
    if points.is_empty() {
        return SliceResult::empty();
    }

    let columns = select_columns(&series, spec.variables.as_deref());
    let rows = match &spec.resample {
        Some(rule) => resample(&points, &columns, rule),
        None => points
            .iter()
            .map(|point| {
                SeriesRow::new(
                    point.timestamp,
                    columns
                        .iter()
                        .map(|name| (name.to_string(), point.fields.get(*name).copied())),
                )
            })
            .collect(),
    };
    SliceResult::new(rows)
}

/// Requested names that exist in the series, in request order; every field
/// when nothing was requested.
fn select_columns<'a>(series: &'a CanonicalSeries, variables: Option<&'a [String]>) -> Vec<&'a str> {
    let available = series.field_names();
    match variables {
        Some(requested) => {
            let mut columns: Vec<&str> = Vec::with_capacity(requested.len());
            for name in requested {
                if available.contains(name.as_str()) && !columns.contains(&name.as_str()) {
                    columns.push(name);
                }
            }
            columns
        }
        None => available.into_iter().collect(),
    }
}
