//! Runtime settings: upstream location, cache lifetimes and request timeout.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_UPSTREAM_BASE: &str = "https://sfc.windbornesystems.com";
/// Raw upstream bodies are kept for 6 hours.
pub const DEFAULT_RAW_TTL_SECS: u64 = 6 * 60 * 60;
/// Computed slices and comparisons are kept for 5 minutes.
pub const DEFAULT_SLICE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidVar { name: &'static str, value: String },
}

/// Settings for [`crate::StationSeries`].
///
/// Every field has a default, so a TOML file or the environment only needs to
/// name what differs.
///
/// ```
/// use station_series::Settings;
///
/// let settings = Settings::from_toml_str("slice_ttl_secs = 60").unwrap();
/// assert_eq!(settings.slice_ttl_secs, 60);
/// assert_eq!(settings.request_timeout_secs, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub upstream_base: String,
    pub raw_ttl_secs: u64,
    pub slice_ttl_secs: u64,
    pub request_timeout_secs: u64,
    /// Directory of the durable cache; the platform cache directory when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upstream_base: DEFAULT_UPSTREAM_BASE.to_string(),
            raw_ttl_secs: DEFAULT_RAW_TTL_SECS,
            slice_ttl_secs: DEFAULT_SLICE_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_dir: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Defaults overridden by `UPSTREAM_BASE`, `CACHE_TTL_RAW`, `CACHE_TTL_SLICE`,
    /// `UPSTREAM_TIMEOUT` and `CACHE_DIR`. A `.env` file is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub(crate) fn from_vars(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        for (name, value) in vars {
            match name.as_str() {
                "UPSTREAM_BASE" => settings.upstream_base = value,
                "CACHE_TTL_RAW" => settings.raw_ttl_secs = parse_secs("CACHE_TTL_RAW", &value)?,
                "CACHE_TTL_SLICE" => {
                    settings.slice_ttl_secs = parse_secs("CACHE_TTL_SLICE", &value)?
                }
                "UPSTREAM_TIMEOUT" => {
                    settings.request_timeout_secs = parse_secs("UPSTREAM_TIMEOUT", &value)?
                }
                "CACHE_DIR" => settings.cache_dir = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        Ok(settings)
    }

    pub fn raw_ttl(&self) -> Duration {
        Duration::from_secs(self.raw_ttl_secs)
    }

    pub fn slice_ttl(&self) -> Duration {
        Duration::from_secs(self.slice_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        value: value.to_string(),
    })
}
