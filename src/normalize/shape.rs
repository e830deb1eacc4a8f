//! Recognition of the upstream document layouts.

use serde_json::{Map, Value};

/// Candidate time keys, in priority order.
pub(crate) const TIME_KEYS: [&str; 5] = ["timestamp", "time", "ts", "date", "datetime"];

/// Time key assumed for row-wise documents whose first row names none of [`TIME_KEYS`].
pub(crate) const DEFAULT_TIME_KEY: &str = "timestamp";

/// The closed set of document layouts the normalizer understands.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DocumentShape<'a> {
    /// `{"points": [{"timestamp": .., "temp": ..}, ..]}`
    RowWise(&'a [Value]),
    /// `{"points": {"timestamp": [..], "temp": [..]}}`
    PointsColumnar(&'a Map<String, Value>),
    /// `{"timestamp": [..], "temp": [..]}`, every top-level value an array.
    TopLevelColumnar(&'a Map<String, Value>),
}

impl<'a> DocumentShape<'a> {
    /// Structural checks, tried in order. `None` means the document is not recognized.
    pub(crate) fn detect(document: &'a Value) -> Option<Self> {
        let Value::Object(object) = document else {
            return None;
        };

        match object.get("points") {
            Some(Value::Array(rows)) => return Some(Self::RowWise(rows)),
            Some(Value::Object(columns)) => return Some(Self::PointsColumnar(columns)),
            _ => {}
        }

        if !object.is_empty() && object.values().all(Value::is_array) {
            Some(Self::TopLevelColumnar(object))
        } else {
            None
        }
    }
}

/// First candidate time key present in `object`.
pub(crate) fn find_time_key(object: &Map<String, Value>) -> Option<&'static str> {
    TIME_KEYS.into_iter().find(|key| object.contains_key(*key))
}
