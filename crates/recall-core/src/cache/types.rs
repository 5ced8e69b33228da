//! Cache types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default lifetime of a generated summary (7 days)
pub const DEFAULT_SUMMARY_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A generated artifact stored under its subject key
///
/// Serialized with the field names of the persisted record layout:
/// `{key, value, generatedAt, expiresAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Subject key (e.g. a product id)
    pub key: String,
    /// Generated artifact
    pub value: String,
    /// When the artifact was generated
    pub generated_at: DateTime<Utc>,
    /// First instant at which the entry is stale
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry generated now
    pub fn new(key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        Self::generated_at(key, value, Utc::now(), ttl)
    }

    /// Create an entry with an explicit generation time
    pub fn generated_at(
        key: impl Into<String>,
        value: impl Into<String>,
        generated_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = generated_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.into(),
            value: value.into(),
            generated_at,
            expires_at,
        }
    }

    /// Whether the entry may be served at `now`
    ///
    /// Live for every `now < expires_at`; stale from `expires_at` on.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Where summaries are kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process memory; lost on restart
    Memory,
    /// One JSON record per key under `directory`
    Disk { directory: PathBuf },
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::Memory
    }
}

impl StoreBackend {
    /// Disk backend under the user's cache directory
    pub fn default_disk() -> Self {
        let directory = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("recall")
            .join("summaries");
        Self::Disk { directory }
    }
}

/// Summary cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryCacheConfig {
    /// Lifetime of a generated summary
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Storage backend
    pub backend: StoreBackend,
}

impl Default for SummaryCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SUMMARY_TTL,
            backend: StoreBackend::Memory,
        }
    }
}

/// Summary cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    /// Reads answered from a live entry
    pub hits: u64,
    /// Reads that found no live entry
    pub misses: u64,
    /// Generator invocations
    pub generations: u64,
    /// Callers that joined a generation already in flight
    pub joined_waiters: u64,
    /// Generations that failed
    pub generation_failures: u64,
    /// Explicit invalidations
    pub invalidations: u64,
    /// Entries physically held by the store (live or not yet evicted)
    pub stored_entries: usize,
}

impl CacheStatistics {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total_requests = self.hits + self.misses;
        if total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / total_requests as f64
        }
    }
}
