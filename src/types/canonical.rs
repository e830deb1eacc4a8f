//! Canonical, numeric-only representation of one station's measurements.

use crate::types::datetime::iso_utc;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// One timestamped record of a canonical series.
///
/// `fields` only ever holds finite values and never contains the time key.
/// Field order follows the upstream document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPoint {
    #[serde(with = "iso_utc")]
    pub timestamp: DateTime<Utc>,
    pub fields: IndexMap<String, f64>,
}

/// Points ordered ascending by timestamp.
///
/// The order is established once, by a stable sort, when the series is built.
/// Points sharing a timestamp are kept in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalSeries {
    points: Vec<CanonicalPoint>,
}

impl CanonicalSeries {
    pub(crate) fn from_unsorted(mut points: Vec<CanonicalPoint>) -> Self {
        points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self { points }
    }

    pub fn points(&self) -> &[CanonicalPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Every field name present anywhere in the series, in order of first appearance.
    pub fn field_names(&self) -> IndexSet<&str> {
        self.points
            .iter()
            .flat_map(|point| point.fields.keys().map(String::as_str))
            .collect()
    }

    pub fn into_points(self) -> Vec<CanonicalPoint> {
        self.points
    }
}

impl<'a> IntoIterator for &'a CanonicalSeries {
    type Item = &'a CanonicalPoint;
    type IntoIter = std::slice::Iter<'a, CanonicalPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
