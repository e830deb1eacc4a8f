//! The main entry point: cached, sliced and merged station series.

use crate::cache::compute::ComputeCache;
use crate::cache::file_store::FileStore;
use crate::cache::key::cache_key;
use crate::cache::store::CacheStore;
use crate::compare::merge;
use crate::config::Settings;
use crate::error::SeriesError;
use crate::slice::builder::build_slice;
use crate::types::results::{MergedResult, StationPoints};
use crate::types::slice_spec::SliceSpec;
use crate::upstream::fetcher::UpstreamFetcher;
use crate::utils::get_cache_dir;
use bon::bon;
use log::debug;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Client serving station slices and comparisons.
///
/// Every read goes through the compute cache: equivalent requests made within
/// the slice TTL are answered without touching the upstream source, and
/// concurrent equivalent requests share one computation. Raw upstream
/// documents are cached separately and revalidated with `ETag` /
/// `Last-Modified`.
///
/// # Examples
///
/// ```no_run
/// # use station_series::{Settings, SeriesError, StationSeries};
/// # #[tokio::main]
/// # async fn main() -> Result<(), SeriesError> {
/// let client = StationSeries::new(Settings::from_env()?).await?;
///
/// let hourly = client
///     .points()
///     .station("KSEA")
///     .start("2024-07-01")
///     .variables(vec!["temperature".to_string(), "wind_speed".to_string()])
///     .resample("1h")
///     .call()
///     .await?;
/// println!("{} rows", hourly.slice.points_count());
///
/// let both = client
///     .compare()
///     .station_ids(vec!["KSEA".to_string(), "KPDX".to_string()])
///     .call()
///     .await?;
/// println!("{:?}", both.ids);
/// # Ok(())
/// # }
/// ```
pub struct StationSeries {
    settings: Settings,
    fetcher: UpstreamFetcher,
    cache: ComputeCache,
}

#[bon]
impl StationSeries {
    /// Creates a client backed by a [`FileStore`] in `settings.cache_dir`, or
    /// in the platform cache directory when that is unset. Entries that expired
    /// since the store was last used are purged.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::CacheDirResolution`] if no cache directory can be
    /// determined, and [`SeriesError::Cache`] if it cannot be created or read.
    pub async fn new(settings: Settings) -> Result<Self, SeriesError> {
        let cache_dir = match &settings.cache_dir {
            Some(dir) => dir.clone(),
            None => get_cache_dir().map_err(SeriesError::CacheDirResolution)?,
        };
        let store = FileStore::new(cache_dir).await?;
        store.purge_expired().await?;
        Self::with_store(settings, Arc::new(store))
    }

    /// Creates a client on top of any [`CacheStore`].
    pub fn with_store(settings: Settings, store: Arc<dyn CacheStore>) -> Result<Self, SeriesError> {
        let fetcher = UpstreamFetcher::from_settings(&settings, store.clone())?;
        Ok(Self {
            settings,
            fetcher,
            cache: ComputeCache::new(store),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Slice of one station's series, from raw request parameters.
    ///
    /// # Arguments
    ///
    /// * `.station(&str)`: **Required.** Upstream station identifier.
    /// * `.start(&str)` / `.end(&str)`: Optional inclusive bounds, RFC 3339 or
    ///   `YYYY-MM-DD[ HH:MM[:SS]]` (naive values are UTC).
    /// * `.variables(Vec<String>)`: Optional field names, in the order wanted.
    /// * `.resample(&str)`: Optional bucket width such as `"15min"`, `"1h"`, `"1d"`.
    ///
    /// # Errors
    ///
    /// [`SeriesError::Slice`] for unparsable parameters, [`SeriesError::Upstream`]
    /// when the document cannot be fetched and [`SeriesError::InvalidDocument`]
    /// when it is not JSON.
    #[builder]
    pub async fn points(
        &self,
        station: &str,
        start: Option<&str>,
        end: Option<&str>,
        variables: Option<Vec<String>>,
        resample: Option<&str>,
    ) -> Result<StationPoints, SeriesError> {
        let spec = SliceSpec::parse(start, end, variables, resample)?;
        self.station_points(station, spec).await
    }

    /// Same as [`StationSeries::points`], for an already parsed [`SliceSpec`].
    pub async fn station_points(
        &self,
        station: &str,
        spec: SliceSpec,
    ) -> Result<StationPoints, SeriesError> {
        let key = cache_key("slice", &(station, &spec))?;
        self.cache
            .get_or_compute(&key, self.settings.slice_ttl(), || async {
                let document = self.fetch_document(station).await?;
                Ok::<_, SeriesError>(StationPoints {
                    station: station.to_string(),
                    start_date: spec.start,
                    end_date: spec.end,
                    slice: build_slice(&document, &spec),
                })
            })
            .await
    }

    /// Several stations' slices joined on timestamp.
    ///
    /// Takes the same optional parameters as [`StationSeries::points`]. Station
    /// ids are de-duplicated and sorted, so the order they are given in does
    /// not matter.
    #[builder]
    pub async fn compare(
        &self,
        station_ids: Vec<String>,
        start: Option<&str>,
        end: Option<&str>,
        variables: Option<Vec<String>>,
        resample: Option<&str>,
    ) -> Result<MergedResult, SeriesError> {
        let spec = SliceSpec::parse(start, end, variables, resample)?;
        self.compare_stations(station_ids, spec).await
    }

    /// Same as [`StationSeries::compare`], for an already parsed [`SliceSpec`].
    pub async fn compare_stations(
        &self,
        station_ids: impl IntoIterator<Item = String>,
        spec: SliceSpec,
    ) -> Result<MergedResult, SeriesError> {
        let ids: Vec<String> = station_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let key = cache_key("cmp", &(&ids, &spec))?;
        self.cache
            .get_or_compute(&key, self.settings.slice_ttl(), || async {
                let mut slices = BTreeMap::new();
                for station in &ids {
                    let document = self.fetch_document(station).await?;
                    slices.insert(station.clone(), build_slice(&document, &spec));
                }
                Ok::<_, SeriesError>(merge(slices))
            })
            .await
    }

    async fn fetch_document(&self, station: &str) -> Result<Value, SeriesError> {
        let raw = self.fetcher.fetch_raw(station).await?;
        debug!("Parsing {} bytes of JSON for station {}", raw.len(), station);
        serde_json::from_str(&raw).map_err(|source| SeriesError::InvalidDocument {
            station: station.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory_store::MemoryStore;
    use crate::slice::error::SliceError;
    use crate::upstream::fetcher::tests::{ok_response, serve};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    const KSEA: &str = r#"{"points":[
        {"timestamp":"2024-07-01T00:00:00Z","temp":15.0,"wind":"3.5","note":"calm"},
        {"timestamp":"2024-07-01T01:00:00Z","temp":14.0,"wind":4},
        {"timestamp":"2024-07-01T02:00:00Z","temp":13.0,"wind":5}
    ]}"#;

    const KPDX: &str = r#"{"timestamp":[1719795600,1719799200],"temp":[20.0,21.0]}"#;

    fn client(base: String, store: Arc<MemoryStore>) -> StationSeries {
        let settings = Settings {
            upstream_base: base,
            ..Settings::default()
        };
        StationSeries::with_store(settings, store).expect("Failed to build client")
    }

    #[tokio::test]
    async fn test_points_are_sliced_and_cached() -> Result<(), SeriesError> {
        let (base, server) = serve(vec![ok_response(KSEA, &[("ETag", "\"k1\"")])]).await;
        let client = client(base, Arc::new(MemoryStore::new()));

        let first = client
            .points()
            .station("KSEA")
            .start("2024-07-01T01:00:00Z")
            .variables(vec!["wind".to_string(), "temp".to_string(), "gust".to_string()])
            .call()
            .await?;
        assert_eq!(first.station, "KSEA");
        assert_eq!(
            first.start_date,
            Some(Utc.with_ymd_and_hms(2024, 7, 1, 1, 0, 0).unwrap())
        );
        assert_eq!(first.end_date, None);
        assert_eq!(first.slice.points_count(), 2);
        let row = &first.slice.points()[0];
        assert_eq!(row.columns().collect::<Vec<_>>(), ["wind", "temp"]);
        assert_eq!(row.get("wind"), Some(4.0));

        // the upstream only answers once, so this must come from the cache
        let second = client
            .points()
            .station("KSEA")
            .start("2024-07-01T01:00:00+00:00")
            .variables(vec!["wind".to_string(), "temp".to_string(), "gust".to_string()])
            .call()
            .await?;
        assert_eq!(second, first);
        assert_eq!(server.await.expect("Server task failed").len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_compare_merges_sorted_unique_stations() -> Result<(), SeriesError> {
        let (base, server) = serve(vec![ok_response(KPDX, &[]), ok_response(KSEA, &[])]).await;
        let client = client(base, Arc::new(MemoryStore::new()));

        let merged = client
            .compare()
            .station_ids(vec!["KSEA".to_string(), "KPDX".to_string(), "KSEA".to_string()])
            .variables(vec!["temp".to_string()])
            .call()
            .await?;
        assert_eq!(merged.ids, ["KPDX", "KSEA"]);
        // KPDX at 01:00 and 02:00, KSEA at 00:00, 01:00 and 02:00
        assert_eq!(merged.points_count(), 3);
        let first = &merged.points()[0];
        assert_eq!(first.get("KSEA:temp"), Some(15.0));
        assert_eq!(first.get("KPDX:temp"), None);
        assert_eq!(merged.points()[1].get("KPDX:temp"), Some(20.0));
        assert_eq!(merged.points()[1].get("KSEA:temp"), Some(14.0));

        let requests = server.await.expect("Server task failed");
        assert!(requests[0].contains("station=kpdx"));
        assert!(requests[1].contains("station=ksea"));

        let again = client
            .compare()
            .station_ids(vec!["KPDX".to_string(), "KSEA".to_string()])
            .variables(vec!["temp".to_string()])
            .call()
            .await?;
        assert_eq!(again, merged);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_json_is_an_error_and_not_cached() {
        let (base, _server) = serve(vec![ok_response("<html>oops</html>", &[])]).await;
        let store = Arc::new(MemoryStore::new());
        let client = client(base, store.clone());

        let result = client.points().station("KSEA").call().await;
        assert!(matches!(
            result,
            Err(SeriesError::InvalidDocument { station, .. }) if station == "KSEA"
        ));
        // only the raw body and nothing computed from it
        assert!(store
            .get("raw:KSEA")
            .await
            .expect("Store read failed")
            .is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_bad_parameters_fail_before_fetching() {
        let client = client("http://127.0.0.1:9".to_string(), Arc::new(MemoryStore::new()));
        let result = client
            .points()
            .station("KSEA")
            .resample("every now and then")
            .call()
            .await;
        assert!(matches!(
            result,
            Err(SeriesError::Slice(SliceError::InvalidResampleRule(_)))
        ));
    }

    #[tokio::test]
    async fn test_new_creates_file_store_in_configured_dir() -> Result<(), SeriesError> {
        let dir = tempdir().expect("Failed to create temp dir");
        let cache_dir = dir.path().join("series");
        let settings = Settings {
            cache_dir: Some(cache_dir.clone()),
            ..Settings::default()
        };
        let client = StationSeries::new(settings).await?;
        assert!(cache_dir.is_dir());
        assert_eq!(client.settings().slice_ttl_secs, 300);
        Ok(())
    }

    #[tokio::test]
    async fn test_opening_purges_expired_files() -> Result<(), SeriesError> {
        let dir = tempdir().expect("Failed to create temp dir");
        let stale = {
            let store = FileStore::new(dir.path()).await?;
            store
                .set("slice:gone", b"{}".to_vec(), Some(std::time::Duration::from_millis(100)))
                .await?;
            store.set("etag:KSEA", b"\"v1\"".to_vec(), None).await?;
            std::fs::read_dir(dir.path())
                .expect("Failed to list cache dir")
                .count()
        };
        assert_eq!(stale, 2);
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        let settings = Settings {
            cache_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        StationSeries::new(settings).await?;
        let remaining = std::fs::read_dir(dir.path())
            .expect("Failed to list cache dir")
            .count();
        assert_eq!(remaining, 1);
        Ok(())
    }
}
