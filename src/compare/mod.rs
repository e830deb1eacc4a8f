//! Alignment of several stations' slices on one timeline.

use crate::types::results::{MergedResult, SliceResult};
use crate::types::row::SeriesRow;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeMap;

/// Full outer join of per-station slices on timestamp.
///
/// Stations are processed in ascending id order and every column is renamed to
/// `"{station_id}:{field}"`. The output has one row per distinct timestamp and
/// every row carries every column, `None` where a station has no value. When a
/// station repeats a timestamp the later value wins.
///
/// # Examples
///
/// ```
/// use station_series::{merge, SeriesRow, SliceResult};
/// use chrono::{TimeZone, Utc};
/// use std::collections::BTreeMap;
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let mut slices = BTreeMap::new();
/// slices.insert("B".to_string(), SliceResult::new(vec![
///     SeriesRow::new(t, [("y".to_string(), Some(2.0))]),
/// ]));
/// slices.insert("A".to_string(), SliceResult::new(vec![
///     SeriesRow::new(t, [("x".to_string(), Some(1.0))]),
/// ]));
///
/// let merged = merge(slices);
/// assert_eq!(merged.ids, ["A", "B"]);
/// assert_eq!(merged.points()[0].columns().collect::<Vec<_>>(), ["A:x", "B:y"]);
/// ```
pub fn merge(slices: BTreeMap<String, SliceResult>) -> MergedResult {
    let ids: Vec<String> = slices.keys().cloned().collect();
    let mut columns: IndexSet<String> = IndexSet::new();
    let mut timeline: BTreeMap<DateTime<Utc>, IndexMap<String, f64>> = BTreeMap::new();

    for (station, slice) in slices {
        for row in slice.into_points() {
            let merged_row = timeline.entry(row.timestamp).or_default();
            for (field, value) in row.values {
                let column = format!("{station}:{field}");
                if let Some(value) = value {
                    merged_row.insert(column.clone(), value);
                }
                columns.insert(column);
            }
        }
    }

    let points = timeline
        .into_iter()
        .map(|(timestamp, mut values)| {
            SeriesRow::new(
                timestamp,
                columns
                    .iter()
                    .map(|column| (column.clone(), values.swap_remove(column))),
            )
        })
        .collect();
    MergedResult::new(ids, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap() + TimeDelta::hours(hour)
    }

    fn slice(rows: &[(i64, &str, Option<f64>)]) -> SliceResult {
        SliceResult::new(
            rows.iter()
                .map(|(hour, field, value)| SeriesRow::new(at(*hour), [(field.to_string(), *value)]))
                .collect(),
        )
    }

    #[test]
    fn test_merge_is_an_outer_join() {
        let mut slices = BTreeMap::new();
        slices.insert("A".to_string(), slice(&[(1, "x", Some(1.0)), (2, "x", Some(2.0))]));
        slices.insert("B".to_string(), slice(&[(3, "y", Some(30.0)), (2, "y", Some(20.0))]));

        let merged = merge(slices);
        assert_eq!(merged.points_count(), 3);
        let rows = merged.points();
        assert_eq!(
            rows.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            [at(1), at(2), at(3)]
        );
        assert_eq!((rows[0].get("A:x"), rows[0].get("B:y")), (Some(1.0), None));
        assert_eq!((rows[1].get("A:x"), rows[1].get("B:y")), (Some(2.0), Some(20.0)));
        assert_eq!((rows[2].get("A:x"), rows[2].get("B:y")), (None, Some(30.0)));
        assert!(rows.iter().all(|r| r.columns().count() == 2));
    }

    #[test]
    fn test_merge_of_empty_slices_keeps_ids() {
        let mut slices = BTreeMap::new();
        slices.insert("KSEA".to_string(), SliceResult::empty());
        slices.insert("KPDX".to_string(), SliceResult::empty());

        let merged = merge(slices);
        assert_eq!(merged.ids, ["KPDX", "KSEA"]);
        assert_eq!(merged.points_count(), 0);
        assert!(merged.points().is_empty());
    }

    #[test]
    fn test_same_field_name_does_not_collide() {
        let mut slices = BTreeMap::new();
        slices.insert("A".to_string(), slice(&[(0, "temp", Some(1.0))]));
        slices.insert("B".to_string(), slice(&[(0, "temp", Some(2.0))]));

        let merged = merge(slices);
        assert_eq!(merged.points_count(), 1);
        assert_eq!(merged.points()[0].get("A:temp"), Some(1.0));
        assert_eq!(merged.points()[0].get("B:temp"), Some(2.0));
    }

    #[test]
    fn test_null_does_not_overwrite_a_value() {
        let mut slices = BTreeMap::new();
        slices.insert(
            "A".to_string(),
            slice(&[(0, "v", Some(1.0)), (0, "v", None), (1, "v", None)]),
        );

        let merged = merge(slices);
        assert_eq!(merged.points_count(), 2);
        assert_eq!(merged.points()[0].get("A:v"), Some(1.0));
        assert_eq!(merged.points()[1].values.get("A:v"), Some(&None));
    }
}
