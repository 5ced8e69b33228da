//! Summary storage backends

use super::types::CacheEntry;
use crate::error::RecallResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt::Debug;

/// Storage interface for summary records
///
/// Writes are whole-record upserts keyed by subject key. A store never returns
/// a partially written record.
#[async_trait]
pub trait SummaryStore: Send + Sync + Debug {
    /// Load the record for `key`, if one is stored and not expired
    async fn load(&self, key: &str) -> RecallResult<Option<CacheEntry>>;

    /// Atomically replace the record for `entry.key`.
    ///
    /// Returns `false` and leaves the stored record untouched when the stored
    /// record was generated after `entry`, so a slow regeneration can never
    /// overwrite a newer one.
    async fn upsert(&self, entry: CacheEntry) -> RecallResult<bool>;

    /// Remove the record for `key`; returns whether one existed
    async fn remove(&self, key: &str) -> RecallResult<bool>;

    /// Drop every record stale at `now`; returns how many were dropped
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> RecallResult<usize>;

    /// Number of records physically stored
    async fn len(&self) -> RecallResult<usize>;
}

/// In-memory summary store
///
/// Backed by a sharded map, so operations on different keys do not contend on
/// a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn load(&self, key: &str) -> RecallResult<Option<CacheEntry>> {
        let now = Utc::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live_at(now) {
                return Ok(Some(entry.clone()));
            }
        }
        // Expired: evict lazily
        self.entries.remove_if(key, |_, entry| !entry.is_live_at(now));
        Ok(None)
    }

    async fn upsert(&self, entry: CacheEntry) -> RecallResult<bool> {
        match self.entries.entry(entry.key.clone()) {
            Entry::Occupied(mut existing) => {
                if existing.get().generated_at > entry.generated_at {
                    return Ok(false);
                }
                existing.insert(entry);
                Ok(true)
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(true)
            }
        }
    }

    async fn remove(&self, key: &str) -> RecallResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> RecallResult<usize> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live_at(now));
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn len(&self) -> RecallResult<usize> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_store_basic_operations() {
        let store = MemoryStore::new();
        let entry = CacheEntry::new("product-1", "solid", Duration::from_secs(60));

        assert!(store.upsert(entry.clone()).await.unwrap());
        assert_eq!(store.load("product-1").await.unwrap(), Some(entry));
        assert_eq!(store.len().await.unwrap(), 1);

        assert!(store.remove("product-1").await.unwrap());
        assert!(!store.remove("product-1").await.unwrap());
        assert!(store.load("product-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_refuses_older_record() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let newer = CacheEntry::generated_at("p", "newer", now, Duration::from_secs(60));
        let older = CacheEntry::generated_at(
            "p",
            "older",
            now - chrono::Duration::seconds(5),
            Duration::from_secs(60),
        );

        assert!(store.upsert(newer).await.unwrap());
        assert!(!store.upsert(older).await.unwrap());
        assert_eq!(store.load("p").await.unwrap().unwrap().value, "newer");
    }

    #[tokio::test]
    async fn test_expired_entries_are_not_loaded() {
        let store = MemoryStore::new();
        let stale = CacheEntry::generated_at(
            "p",
            "old news",
            Utc::now() - chrono::Duration::days(8),
            Duration::from_secs(7 * 24 * 3600),
        );
        store.upsert(stale).await.unwrap();

        assert!(store.load("p").await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .upsert(CacheEntry::generated_at(
                "stale",
                "x",
                now - chrono::Duration::hours(2),
                Duration::from_secs(3600),
            ))
            .await
            .unwrap();
        store
            .upsert(CacheEntry::new("fresh", "y", Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(store.cleanup_expired(Utc::now()).await.unwrap(), 1);
        assert_eq!(store.len().await.unwrap(), 1);
        assert!(store.load("fresh").await.unwrap().is_some());
    }
}
