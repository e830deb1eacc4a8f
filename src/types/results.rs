//! Payloads returned by the read paths. All of them are plain serde data so the
//! compute cache can store them as JSON.

use crate::types::datetime::iso_utc_opt;
use crate::types::row::SeriesRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rows of one station after filtering, projection and optional resampling.
///
/// `points_count` always equals the number of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceResult {
    points: Vec<SeriesRow>,
    points_count: usize,
}

impl SliceResult {
    pub fn new(points: Vec<SeriesRow>) -> Self {
        let points_count = points.len();
        Self {
            points,
            points_count,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[SeriesRow] {
        &self.points
    }

    pub fn points_count(&self) -> usize {
        self.points_count
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<SeriesRow> {
        self.points
    }
}

/// Response of the single-station read path.
///
/// `start_date` and `end_date` echo the requested bounds in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPoints {
    pub station: String,
    #[serde(with = "iso_utc_opt")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(with = "iso_utc_opt")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub slice: SliceResult,
}

/// Several stations joined on a shared timeline.
///
/// Columns are named `"{station_id}:{field}"`. `ids` is the sorted,
/// de-duplicated list of requested stations, kept even when no rows exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    pub ids: Vec<String>,
    points: Vec<SeriesRow>,
    points_count: usize,
}

impl MergedResult {
    pub fn new(ids: Vec<String>, points: Vec<SeriesRow>) -> Self {
        let points_count = points.len();
        Self {
            ids,
            points,
            points_count,
        }
    }

    pub fn points(&self) -> &[SeriesRow] {
        &self.points
    }

    pub fn points_count(&self) -> usize {
        self.points_count
    }
}
