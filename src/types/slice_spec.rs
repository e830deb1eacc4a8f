//! Immutable description of a slice request.

use crate::slice::error::SliceError;
use crate::types::datetime::parse_datetime;
use crate::types::resample_rule::ResampleRule;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What to cut out of a station's series.
///
/// Bounds are inclusive. `variables` keeps the caller's order; when it is
/// `None` every field of the series is returned.
///
/// Build one from typed values with [`SliceSpec::builder`], or from the raw
/// strings a route layer receives with [`SliceSpec::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Builder)]
pub struct SliceSpec {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub variables: Option<Vec<String>>,
    pub resample: Option<ResampleRule>,
}

impl SliceSpec {
    /// Parses raw request parameters.
    ///
    /// Blank variable names are dropped and repeated names keep their first
    /// position; a list with nothing left in it means "all variables".
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidDateTime`] for an unparsable bound and
    /// [`SliceError::InvalidResampleRule`] for an unknown frequency descriptor.
    pub fn parse(
        start: Option<&str>,
        end: Option<&str>,
        variables: Option<Vec<String>>,
        resample: Option<&str>,
    ) -> Result<Self, SliceError> {
        Ok(Self {
            start: start.map(|raw| parse_bound("start", raw)).transpose()?,
            end: end.map(|raw| parse_bound("end", raw)).transpose()?,
            variables: variables.and_then(clean_variables),
            resample: resample.map(str::parse::<ResampleRule>).transpose()?,
        })
    }

    pub(crate) fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| timestamp >= start)
            && self.end.map_or(true, |end| timestamp <= end)
    }
}

fn parse_bound(field: &'static str, raw: &str) -> Result<DateTime<Utc>, SliceError> {
    parse_datetime(raw).ok_or_else(|| SliceError::InvalidDateTime {
        field,
        value: raw.to_string(),
    })
}

fn clean_variables(variables: Vec<String>) -> Option<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::with_capacity(variables.len());
    for name in variables {
        let name = name.trim();
        if !name.is_empty() && !cleaned.iter().any(|kept| kept == name) {
            cleaned.push(name.to_string());
        }
    }
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Splits a comma-separated variable list as sent by clients.
///
/// ```
/// use station_series::parse_variables;
///
/// assert_eq!(
///     parse_variables("temp, wind,,temp ,"),
///     Some(vec!["temp".to_string(), "wind".to_string()])
/// );
/// assert_eq!(parse_variables(" , "), None);
/// ```
pub fn parse_variables(raw: &str) -> Option<Vec<String>> {
    clean_variables(raw.split(',').map(str::to_string).collect())
}
