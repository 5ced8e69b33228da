//! Summary cache with single-flight generation

use super::disk::DiskStore;
use super::key_state::KeyStates;
use super::storage::{MemoryStore, SummaryStore};
use super::types::{CacheEntry, CacheStatistics, StoreBackend, SummaryCacheConfig};
use crate::concurrency::{KeyedMutex, SingleFlight};
use crate::error::{RecallError, RecallResult};
use crate::validation::validate_key;
use chrono::Utc;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Identifies one generation attempt: a key within one invalidation epoch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FlightKey {
    key: String,
    epoch: u64,
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
    invalidations: AtomicU64,
}

/// Memoizes expensive generations by subject key.
///
/// - A hit is served straight from the store and never waits on a generation.
/// - Concurrent misses for the same key run the generator once and share its
///   result or its error. Failures are never cached.
/// - A generation keeps running when the caller that started it goes away.
/// - [`invalidate`](Self::invalidate) makes the key absent immediately; a
///   generation already in flight still answers its waiters but its result is
///   not stored.
///
/// Construct one per process and share it behind an `Arc`.
#[derive(Debug)]
pub struct SummaryCache {
    store: Arc<dyn SummaryStore>,
    ttl: Duration,
    flights: SingleFlight<FlightKey, String>,
    /// Invalidation epochs and running generations of keys in use
    keys: Arc<KeyStates>,
    /// Serializes store writes against invalidation for one key
    write_locks: Arc<KeyedMutex<String>>,
    counters: Arc<Counters>,
}

impl SummaryCache {
    /// Create a cache from configuration
    pub fn new(config: SummaryCacheConfig) -> RecallResult<Self> {
        if config.ttl.is_zero() {
            return Err(RecallError::config("summary ttl must be greater than zero"));
        }
        let store: Arc<dyn SummaryStore> = match &config.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Disk { directory } => Arc::new(DiskStore::new(directory)?),
        };
        Ok(Self::with_store(store, config.ttl))
    }

    /// Create an in-memory cache with the given TTL
    pub fn in_memory(ttl: Duration) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), ttl)
    }

    /// Create a cache over an existing store
    pub fn with_store(store: Arc<dyn SummaryStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            flights: SingleFlight::new(),
            keys: KeyStates::new(),
            write_locks: Arc::new(KeyedMutex::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Lifetime given to newly generated entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live artifact for `key`, if any. Never generates.
    pub async fn get(&self, key: &str) -> RecallResult<Option<String>> {
        validate_key("key", key)?;
        let value = self.lookup(key).await?;
        self.record_lookup(value.is_some());
        Ok(value)
    }

    /// Return the live artifact for `key`, generating it on a miss.
    ///
    /// `generator` is called with the key at most once per group of concurrent
    /// misses; every caller in the group receives the same value or the same
    /// [`RecallError::Generation`]. On success the value is stored with a
    /// fresh expiry. Retrying a failed generator is up to the caller.
    #[instrument(skip(self, generator), level = "debug")]
    pub async fn get_or_generate<F, Fut>(&self, key: &str, generator: F) -> RecallResult<String>
    where
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = RecallResult<String>> + Send + 'static,
    {
        validate_key("key", key)?;

        if let Some(value) = self.lookup(key).await? {
            self.record_lookup(true);
            return Ok(value);
        }
        self.record_lookup(false);

        // Held until this call returns; the flight holds its own copy.
        let lease = self.keys.lease(key);
        let flight_key = FlightKey {
            key: key.to_string(),
            epoch: lease.epoch(),
        };
        let flight_lease = lease.clone();

        let store = Arc::clone(&self.store);
        let write_locks = Arc::clone(&self.write_locks);
        let counters = Arc::clone(&self.counters);
        let ttl = self.ttl;

        let result = self
            .flights
            .run(flight_key, move || async move {
                let lease = flight_lease;
                let key = lease.key();

                // A flight that finished between our miss and this one may
                // already have stored a value.
                if let Some(entry) = store.load(key).await? {
                    debug!("'{}' was filled while waiting to generate", key);
                    return Ok(entry.value);
                }

                let slot = lease.begin_generation()?;
                debug!("Generating summary for '{}'", key);
                let generated = generator(key.to_string()).await;
                drop(slot);
                let value = match generated {
                    Ok(value) => value,
                    Err(e) => {
                        counters.failures.fetch_add(1, Ordering::Relaxed);
                        warn!("Generation for '{}' failed: {}", key, e);
                        return Err(e.into_generation(key));
                    }
                };

                let _guard = write_locks.lock(key.to_string()).await;
                if !lease.is_current() {
                    debug!(
                        "'{}' was invalidated during generation; result not stored",
                        key
                    );
                    return Ok(value);
                }

                let entry = CacheEntry::new(key, value.clone(), ttl);
                match store.upsert(entry).await {
                    Ok(true) => {}
                    Ok(false) => debug!("Kept a newer stored summary for '{}'", key),
                    Err(e) => warn!("Failed to store summary for '{}': {}", key, e),
                }
                Ok(value)
            })
            .await;
        drop(lease);
        result
    }

    /// Force the next read of `key` to miss, regardless of expiry
    pub async fn invalidate(&self, key: &str) -> RecallResult<()> {
        validate_key("key", key)?;

        let _guard = self.write_locks.lock(key.to_string()).await;
        self.keys.invalidate(key);
        self.store.remove(key).await?;
        self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!("Invalidated summary for '{}'", key);
        Ok(())
    }

    /// Evict every stale entry from the store
    pub async fn cleanup_expired(&self) -> RecallResult<usize> {
        let removed = self.store.cleanup_expired(Utc::now()).await?;
        if removed > 0 {
            debug!("Evicted {} expired summaries", removed);
        }
        Ok(removed)
    }

    /// Whether a generation for `key` is currently running
    pub fn is_generating(&self, key: &str) -> bool {
        self.keys.current_epoch(key).is_some_and(|epoch| {
            self.flights.is_in_flight(&FlightKey {
                key: key.to_string(),
                epoch,
            })
        })
    }

    /// Get cache statistics
    pub async fn statistics(&self) -> RecallResult<CacheStatistics> {
        let flights = self.flights.stats();
        Ok(CacheStatistics {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            generations: flights.started,
            joined_waiters: flights.joined,
            generation_failures: self.counters.failures.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            stored_entries: self.store.len().await?,
        })
    }

    async fn lookup(&self, key: &str) -> RecallResult<Option<String>> {
        let now = Utc::now();
        Ok(self
            .store
            .load(key)
            .await?
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.value))
    }

    fn record_lookup(&self, hit: bool) {
        let counter = if hit {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_SUMMARY_TTL;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::AtomicUsize;

    /// Misses on the first load, then serves what another writer stored
    #[derive(Debug, Default)]
    struct FilledAfterFirstLoad {
        inner: MemoryStore,
        loads: AtomicUsize,
    }

    #[async_trait]
    impl SummaryStore for FilledAfterFirstLoad {
        async fn load(&self, key: &str) -> RecallResult<Option<CacheEntry>> {
            if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(None);
            }
            self.inner.load(key).await
        }

        async fn upsert(&self, entry: CacheEntry) -> RecallResult<bool> {
            self.inner.upsert(entry).await
        }

        async fn remove(&self, key: &str) -> RecallResult<bool> {
            self.inner.remove(key).await
        }

        async fn cleanup_expired(&self, now: DateTime<Utc>) -> RecallResult<usize> {
            self.inner.cleanup_expired(now).await
        }

        async fn len(&self) -> RecallResult<usize> {
            self.inner.len().await
        }
    }

    #[tokio::test]
    async fn test_generator_not_called_when_store_filled_before_generation() {
        let store = Arc::new(FilledAfterFirstLoad::default());
        store
            .inner
            .upsert(CacheEntry::new(
                "product-12",
                "from other flight",
                DEFAULT_SUMMARY_TTL,
            ))
            .await
            .unwrap();
        let cache = SummaryCache::with_store(store, DEFAULT_SUMMARY_TTL);

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let value = cache
            .get_or_generate("product-12", move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                async { Ok("generated".to_string()) }
            })
            .await
            .unwrap();

        assert_eq!(value, "from other flight");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.statistics().await.unwrap().generations, 1);
    }

    #[tokio::test]
    async fn test_key_state_is_dropped_after_flights_finish() {
        let cache = Arc::new(SummaryCache::in_memory(DEFAULT_SUMMARY_TTL));

        let pending = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_generate("product-4", |_| async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok("outdated".to_string())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.keys.len(), 1);

        cache.invalidate("product-4").await.unwrap();
        assert_eq!(pending.await.unwrap().unwrap(), "outdated");
        assert_eq!(cache.keys.len(), 0);

        for i in 0..50 {
            let key = format!("product-{i}");
            cache
                .get_or_generate(&key, |key| async move { Ok(key) })
                .await
                .unwrap();
            cache.invalidate(&key).await.unwrap();
        }
        assert_eq!(cache.keys.len(), 0);
        assert!(!cache.is_generating("product-4"));
    }
}

