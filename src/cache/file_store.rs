use crate::cache::error::CacheError;
use crate::cache::store::CacheStore;
use async_trait::async_trait;
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::{fs, task};

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

#[derive(Serialize, Deserialize)]
struct FileEntry {
    expires_at_ms: Option<i64>,
    value: Vec<u8>,
}

/// Durable [`CacheStore`] keeping one file per key in a directory.
///
/// File names are the SHA-256 of the key. Each file holds a bincode envelope
/// with the expiry instant, and is replaced atomically on write. Files that
/// fail to decode are removed and read as misses. Expired files are removed
/// when read, and by [`FileStore::purge_expired`] for keys nobody reads again.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store in `dir`, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::DirCreation(dir.clone(), e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.dir.join(format!("{:x}.bin", hasher.finalize()))
    }

    async fn remove(path: &Path) -> Result<(), CacheError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Delete(path.to_path_buf(), e)),
        }
    }

    /// Decodes the entry at `path`. Expired or undecodable files are removed
    /// and read as `None`.
    async fn read_live(path: &Path) -> Result<Option<FileEntry>, CacheError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Read(path.to_path_buf(), e)),
        };

        let entry = match bincode::serde::decode_from_slice::<FileEntry, _>(&bytes, BINCODE_CONFIG) {
            Ok((entry, _)) => entry,
            Err(e) => {
                warn!("Discarding undecodable cache file {:?}: {}", path, e);
                Self::remove(path).await?;
                return Ok(None);
            }
        };

        if entry
            .expires_at_ms
            .is_some_and(|deadline| deadline <= Utc::now().timestamp_millis())
        {
            debug!("Cache file {:?} expired", path);
            Self::remove(path).await?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Removes every expired or undecodable entry file in the directory and
    /// returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, CacheError> {
        let mut listing = fs::read_dir(&self.dir)
            .await
            .map_err(|e| CacheError::Read(self.dir.clone(), e))?;
        let mut removed = 0;
        while let Some(file) = listing
            .next_entry()
            .await
            .map_err(|e| CacheError::Read(self.dir.clone(), e))?
        {
            let path = file.path();
            if path.extension().is_some_and(|ext| ext == "bin")
                && Self::read_live(&path).await?.is_none()
            {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Purged {} stale cache files from {:?}", removed, self.dir);
        }
        Ok(removed)
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(Self::read_live(&self.path_for(key))
            .await?
            .map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let expires_at_ms = ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            Utc::now().timestamp_millis().saturating_add(ttl_ms)
        });
        let encoded = bincode::serde::encode_to_vec(FileEntry { expires_at_ms, value }, BINCODE_CONFIG)
            .map_err(|e| CacheError::Encode(Box::new(e)))?;

        let dir = self.dir.clone();
        task::spawn_blocking(move || {
            let mut temp_file =
                NamedTempFile::new_in(&dir).map_err(|e| CacheError::Write(path.clone(), e))?;
            temp_file
                .write_all(&encoded)
                .map_err(|e| CacheError::Write(path.clone(), e))?;
            temp_file
                .persist(&path)
                .map_err(|e| CacheError::Write(path.clone(), e.error))?;
            Ok::<(), CacheError>(())
        })
        .await??;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        Self::remove(&self.path_for(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_values_survive_reopening() -> Result<(), CacheError> {
        let dir = tempdir().expect("Failed to create temp dir");
        {
            let store = FileStore::new(dir.path()).await?;
            store.set("raw:KSEA", b"{\"points\":[]}".to_vec(), None).await?;
        }
        let store = FileStore::new(dir.path()).await?;
        assert_eq!(
            store.get("raw:KSEA").await?,
            Some(b"{\"points\":[]}".to_vec())
        );
        assert_eq!(store.get("raw:KPDX").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_overwrite_and_delete() -> Result<(), CacheError> {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = FileStore::new(dir.path().join("nested")).await?;
        store.set("k", b"one".to_vec(), None).await?;
        store.set("k", b"two".to_vec(), None).await?;
        assert_eq!(store.get("k").await?, Some(b"two".to_vec()));

        store.delete("k").await?;
        store.delete("k").await?;
        assert_eq!(store.get("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_entries_are_removed() -> Result<(), CacheError> {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = FileStore::new(dir.path()).await?;
        store
            .set("k", b"v".to_vec(), Some(Duration::from_millis(150)))
            .await?;
        assert!(store.get("k").await?.is_some());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(store.get("k").await?, None);
        assert!(!store.path_for("k").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_undecodable_file_is_a_miss() -> Result<(), CacheError> {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = FileStore::new(dir.path()).await?;
        let path = store.path_for("k");
        std::fs::write(&path, b"{garbage").expect("Failed to write test file");

        assert_eq!(store.get("k").await?, None);
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_purge_removes_entries_nobody_reads_again() -> Result<(), CacheError> {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = FileStore::new(dir.path()).await?;
        store
            .set("slice:old", b"v".to_vec(), Some(Duration::from_millis(100)))
            .await?;
        store.set("etag:KSEA", b"\"v1\"".to_vec(), None).await?;
        store
            .set("raw:KSEA", b"{}".to_vec(), Some(Duration::from_secs(60)))
            .await?;
        std::fs::write(store.path_for("broken"), b"{garbage").expect("Failed to write test file");
        std::fs::write(dir.path().join("notes.txt"), b"keep me").expect("Failed to write test file");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.purge_expired().await?, 2);

        assert!(!store.path_for("slice:old").exists());
        assert!(!store.path_for("broken").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(store.get("etag:KSEA").await?, Some(b"\"v1\"".to_vec()));
        assert_eq!(store.get("raw:KSEA").await?, Some(b"{}".to_vec()));
        assert_eq!(store.purge_expired().await?, 0);
        Ok(())
    }
}
