//! Bucketing of points into fixed-width windows with bounded gap filling.

use crate::types::canonical::CanonicalPoint;
use crate::types::resample_rule::ResampleRule;
use crate::types::row::SeriesRow;
use std::collections::BTreeMap;

/// Longest run of empty buckets filled by interpolation, per column.
pub(crate) const MAX_INTERPOLATED_BUCKETS: usize = 2;

/// Averages `points` per bucket and column, then interpolates short gaps.
///
/// `points` must be sorted ascending. A row is emitted for every bucket that
/// either received points or gained an interpolated value. Only those buckets
/// are ever materialized, whatever the distance between points.
pub(crate) fn resample(
    points: &[&CanonicalPoint],
    columns: &[&str],
    rule: &ResampleRule,
) -> Vec<SeriesRow> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let origin = ResampleRule::origin(first.timestamp);

    let mut sums: BTreeMap<i64, Vec<(f64, u32)>> = BTreeMap::new();
    for point in points {
        let bucket = sums
            .entry(rule.bucket_index(origin, point.timestamp))
            .or_insert_with(|| vec![(0.0, 0); columns.len()]);
        for (column, name) in columns.iter().enumerate() {
            if let Some(value) = point.fields.get(*name) {
                let (sum, count) = &mut bucket[column];
                *sum += value;
                *count += 1;
            }
        }
    }

    let means: BTreeMap<i64, Vec<Option<f64>>> = sums
        .into_iter()
        .map(|(index, cells)| {
            let row = cells
                .into_iter()
                .map(|(sum, count)| (count > 0).then(|| sum / f64::from(count)))
                .collect();
            (index, row)
        })
        .collect();

    let mut grid = means.clone();
    for column in 0..columns.len() {
        let known = means
            .iter()
            .filter_map(|(index, row)| row[column].map(|value| (*index, value)));
        for (index, value) in gap_fills(known, MAX_INTERPOLATED_BUCKETS) {
            grid.entry(index)
                .or_insert_with(|| vec![None; columns.len()])[column] = Some(value);
        }
    }

    grid.into_iter()
        .map(|(index, row)| {
            SeriesRow::new(
                rule.bucket_start(origin, index),
                columns
                    .iter()
                    .map(|name| name.to_string())
                    .zip(row),
            )
        })
        .collect()
}

/// Interpolated values for the first `limit` buckets of every interior gap
/// between consecutive `known` buckets (ascending by index). Leading and
/// trailing gaps get nothing.
pub(crate) fn gap_fills(
    known: impl IntoIterator<Item = (i64, f64)>,
    limit: usize,
) -> Vec<(i64, f64)> {
    let mut fills = Vec::new();
    let mut previous: Option<(i64, f64)> = None;
    for (index, value) in known {
        if let Some((previous_index, previous_value)) = previous {
            let span = index - previous_index;
            let steps = (span - 1).clamp(0, limit as i64);
            for step in 1..=steps {
                fills.push((
                    previous_index + step,
                    previous_value + (value - previous_value) * step as f64 / span as f64,
                ));
            }
        }
        previous = Some((index, value));
    }
    fills
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use indexmap::IndexMap;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
    }

    fn point(offset_minutes: i64, fields: &[(&str, f64)]) -> CanonicalPoint {
        CanonicalPoint {
            timestamp: t0() + TimeDelta::minutes(offset_minutes),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<IndexMap<_, _>>(),
        }
    }

    #[test]
    fn test_interpolate_short_gap() {
        let fills = gap_fills([(0, 0.0), (3, 3.0)], 2);
        assert_eq!(fills, [(1, 1.0), (2, 2.0)]);
    }

    #[test]
    fn test_interpolate_long_gap_fills_only_the_limit() {
        let fills = gap_fills([(0, 0.0), (5, 5.0)], 2);
        assert_eq!(fills, [(1, 1.0), (2, 2.0)]);
    }

    #[test]
    fn test_interpolate_leaves_edges_and_neighbours_alone() {
        assert!(gap_fills([(1, 1.0)], 2).is_empty());
        assert!(gap_fills([(1, 1.0), (2, 4.0)], 2).is_empty());
        assert!(gap_fills(std::iter::empty(), 2).is_empty());
    }

    #[test]
    fn test_resample_means_per_bucket() {
        let points = [
            point(0, &[("temp", 1.0)]),
            point(20, &[("temp", 3.0), ("rh", 50.0)]),
            point(70, &[("temp", 10.0)]),
        ];
        let refs: Vec<&CanonicalPoint> = points.iter().collect();
        let rule: ResampleRule = "1h".parse().unwrap();

        let rows = resample(&refs, &["temp", "rh"], &rule);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, t0());
        assert_eq!(rows[0].get("temp"), Some(2.0));
        assert_eq!(rows[0].get("rh"), Some(50.0));
        assert_eq!(rows[1].timestamp, t0() + TimeDelta::hours(1));
        assert_eq!(rows[1].get("temp"), Some(10.0));
        assert_eq!(rows[1].values.get("rh"), Some(&None));
    }

    #[test]
    fn test_resample_gap_rule() {
        let points = [
            point(0, &[("v", 0.0)]),
            point(60, &[("v", 1.0)]),
            point(240, &[("v", 4.0)]),
        ];
        let refs: Vec<&CanonicalPoint> = points.iter().collect();
        let rule: ResampleRule = "1h".parse().unwrap();

        let rows = resample(&refs, &["v"], &rule);
        let hours: Vec<i64> = rows.iter().map(|r| (r.timestamp - t0()).num_hours()).collect();
        assert_eq!(hours, [0, 1, 2, 3, 4]);
        assert_eq!(rows[2].get("v"), Some(2.0));
        assert_eq!(rows[3].get("v"), Some(3.0));
    }

    #[test]
    fn test_resample_drops_buckets_beyond_the_gap_limit() {
        let points = [point(0, &[("v", 0.0)]), point(300, &[("v", 5.0)])];
        let refs: Vec<&CanonicalPoint> = points.iter().collect();
        let rule: ResampleRule = "1h".parse().unwrap();

        let rows = resample(&refs, &["v"], &rule);
        let hours: Vec<i64> = rows.iter().map(|r| (r.timestamp - t0()).num_hours()).collect();
        assert_eq!(hours, [0, 1, 2, 5]);
    }

    #[test]
    fn test_resample_anchors_buckets_at_midnight() {
        let points = [point(50, &[("v", 1.0)]), point(95, &[("v", 3.0)])];
        let refs: Vec<&CanonicalPoint> = points.iter().collect();
        let rule: ResampleRule = "30min".parse().unwrap();

        let rows = resample(&refs, &["v"], &rule);
        let minutes: Vec<i64> = rows.iter().map(|r| (r.timestamp - t0()).num_minutes()).collect();
        assert_eq!(minutes, [30, 60, 90]);
        assert_eq!(rows[1].get("v"), Some(2.0));
    }

    #[test]
    fn test_resample_wide_span_only_builds_populated_buckets() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let fields = |v: f64| {
            ["a", "b", "c", "d"]
                .iter()
                .map(|k| (k.to_string(), v))
                .collect::<IndexMap<_, _>>()
        };
        let points = [
            CanonicalPoint { timestamp: start, fields: fields(0.0) },
            CanonicalPoint { timestamp: end, fields: fields(10.0) },
        ];
        let refs: Vec<&CanonicalPoint> = points.iter().collect();
        let rule: ResampleRule = "1s".parse().unwrap();

        let rows = resample(&refs, &["a", "b", "c", "d"], &rule);
        let stamps: Vec<_> = rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(
            stamps,
            [start, start + TimeDelta::seconds(1), start + TimeDelta::seconds(2), end]
        );
        assert_eq!(rows[0].get("d"), Some(0.0));
        assert!(rows[1].get("a").is_some_and(|v| v > 0.0 && v < 0.001));
        assert_eq!(rows[3].get("c"), Some(10.0));
    }
}
