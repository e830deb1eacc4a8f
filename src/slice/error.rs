use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SliceError {
    #[error("Invalid {field} datetime '{value}'")]
    InvalidDateTime { field: &'static str, value: String },

    #[error("Invalid resample rule '{0}', expected e.g. '15min', '1h' or '1d'")]
    InvalidResampleRule(String),
}
