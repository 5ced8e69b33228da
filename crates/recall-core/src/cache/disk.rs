//! Disk-backed summary store

use super::storage::SummaryStore;
use super::types::CacheEntry;
use crate::concurrency::KeyedMutex;
use crate::error::{RecallError, RecallResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};

/// Stores one JSON record per key under a directory.
///
/// File names are the SHA-256 of the key, so arbitrary keys map to safe paths.
/// Records are written to a temporary file and renamed into place, so readers
/// see either the old or the new record, never a torn one. Writes to the same
/// key are serialized; writes to different keys proceed in parallel.
#[derive(Debug)]
pub struct DiskStore {
    base_dir: PathBuf,
    write_locks: KeyedMutex<String>,
    tmp_counter: AtomicU64,
}

impl DiskStore {
    /// Create a disk store, creating `base_dir` if needed
    pub fn new(base_dir: impl AsRef<Path>) -> RecallResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir).map_err(|e| {
            RecallError::io_with_path(
                format!("Failed to create summary directory: {}", e),
                base_dir.display().to_string(),
            )
        })?;

        Ok(Self {
            base_dir,
            write_locks: KeyedMutex::new(),
            tmp_counter: AtomicU64::new(0),
        })
    }

    /// Directory holding the records
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.base_dir.join(format!("{:x}.json", digest))
    }

    async fn read_record(&self, path: &Path) -> RecallResult<Option<CacheEntry>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RecallError::storage_with_context(
                    format!("Failed to read summary record: {}", e),
                    path.display().to_string(),
                ));
            }
        };

        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // Corrupted record, remove it
                warn!("Discarding corrupted summary record {}: {}", path.display(), e);
                remove_file_if_exists(path).await?;
                Ok(None)
            }
        }
    }

    async fn write_record(&self, path: &Path, entry: &CacheEntry) -> RecallResult<()> {
        let content = serde_json::to_string_pretty(entry)?;
        let tmp_path = path.with_extension(format!(
            "json.tmp-{}",
            self.tmp_counter.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp_path, content).await.map_err(|e| {
            RecallError::storage_with_context(
                format!("Failed to write summary record: {}", e),
                tmp_path.display().to_string(),
            )
        })?;
        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(RecallError::storage_with_context(
                format!("Failed to commit summary record: {}", e),
                path.display().to_string(),
            ));
        }
        Ok(())
    }

    async fn record_paths(&self) -> RecallResult<Vec<PathBuf>> {
        let mut dir = fs::read_dir(&self.base_dir).await.map_err(|e| {
            RecallError::storage(format!("Failed to read summary directory: {}", e))
        })?;

        let mut paths = Vec::new();
        while let Some(dir_entry) = dir
            .next_entry()
            .await
            .map_err(|e| RecallError::storage(format!("Failed to read directory entry: {}", e)))?
        {
            let path = dir_entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

async fn remove_file_if_exists(path: &Path) -> RecallResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RecallError::storage_with_context(
            format!("Failed to remove summary record: {}", e),
            path.display().to_string(),
        )),
    }
}

#[async_trait]
impl SummaryStore for DiskStore {
    async fn load(&self, key: &str) -> RecallResult<Option<CacheEntry>> {
        let path = self.record_path(key);
        match self.read_record(&path).await? {
            Some(entry) if entry.key != key => {
                warn!("Summary record {} belongs to another key", path.display());
                Ok(None)
            }
            Some(entry) if !entry.is_live_at(Utc::now()) => {
                let _guard = self.write_locks.lock(key.to_string()).await;
                // Re-read under the lock; a fresh record may have replaced it.
                if let Some(current) = self.read_record(&path).await? {
                    if current.is_live_at(Utc::now()) {
                        return Ok(Some(current));
                    }
                    remove_file_if_exists(&path).await?;
                    debug!("Evicted expired summary for '{}'", key);
                }
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn upsert(&self, entry: CacheEntry) -> RecallResult<bool> {
        let path = self.record_path(&entry.key);
        let _guard = self.write_locks.lock(entry.key.clone()).await;

        if let Some(existing) = self.read_record(&path).await? {
            if existing.generated_at > entry.generated_at {
                return Ok(false);
            }
        }
        self.write_record(&path, &entry).await?;
        Ok(true)
    }

    async fn remove(&self, key: &str) -> RecallResult<bool> {
        let _guard = self.write_locks.lock(key.to_string()).await;
        remove_file_if_exists(&self.record_path(key)).await
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> RecallResult<usize> {
        let mut removed = 0;
        for path in self.record_paths().await? {
            let Some(entry) = self.read_record(&path).await? else {
                continue;
            };
            if entry.is_live_at(now) {
                continue;
            }
            let _guard = self.write_locks.lock(entry.key.clone()).await;
            if let Some(current) = self.read_record(&path).await? {
                if !current.is_live_at(now) && remove_file_if_exists(&path).await? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn len(&self) -> RecallResult<usize> {
        Ok(self.record_paths().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_disk_store_roundtrip_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path()).unwrap();
        let entry = CacheEntry::new("catalog/shoes/42", "comfortable", Duration::from_secs(60));

        assert!(store.upsert(entry.clone()).await.unwrap());
        assert_eq!(store.load("catalog/shoes/42").await.unwrap(), Some(entry));
        assert_eq!(store.len().await.unwrap(), 1);

        assert!(store.remove("catalog/shoes/42").await.unwrap());
        assert!(store.load("catalog/shoes/42").await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = DiskStore::new(temp_dir.path()).unwrap();
            store
                .upsert(CacheEntry::new("product-5", "durable", Duration::from_secs(60)))
                .await
                .unwrap();
        }

        let reopened = DiskStore::new(temp_dir.path()).unwrap();
        let entry = reopened.load("product-5").await.unwrap().unwrap();
        assert_eq!(entry.value, "durable");
    }

    #[tokio::test]
    async fn test_expired_record_is_evicted_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path()).unwrap();
        store
            .upsert(CacheEntry::generated_at(
                "product-6",
                "stale",
                Utc::now() - chrono::Duration::days(8),
                Duration::from_secs(7 * 24 * 3600),
            ))
            .await
            .unwrap();

        assert!(store.load("product-6").await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupted_record_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path()).unwrap();
        std::fs::write(store.record_path("product-7"), "{ not json").unwrap();

        assert!(store.load("product-7").await.unwrap().is_none());
        assert!(!store.record_path("product-7").exists());
    }

    #[tokio::test]
    async fn test_upsert_keeps_newer_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path()).unwrap();
        let now = Utc::now();

        store
            .upsert(CacheEntry::generated_at("p", "newer", now, Duration::from_secs(60)))
            .await
            .unwrap();
        let accepted = store
            .upsert(CacheEntry::generated_at(
                "p",
                "older",
                now - chrono::Duration::seconds(30),
                Duration::from_secs(60),
            ))
            .await
            .unwrap();

        assert!(!accepted);
        assert_eq!(store.load("p").await.unwrap().unwrap().value, "newer");
    }

    #[tokio::test]
    async fn test_cleanup_expired_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path()).unwrap();
        let now = Utc::now();
        store
            .upsert(CacheEntry::generated_at(
                "old",
                "x",
                now - chrono::Duration::hours(3),
                Duration::from_secs(3600),
            ))
            .await
            .unwrap();
        store
            .upsert(CacheEntry::new("new", "y", Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(store.cleanup_expired(Utc::now()).await.unwrap(), 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }
}
