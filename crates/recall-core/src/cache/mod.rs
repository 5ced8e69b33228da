//! Summary cache
//!
//! Memoizes expensive, externally generated artifacts (review summaries) by
//! subject key with a fixed time-to-live.
//!
//! ## Guarantees
//!
//! - **Stale-free reads**: an entry is served only while `now < expires_at`
//! - **Single-flight**: concurrent misses on one key share one generation
//! - **No poisoning**: failed generations are reported, never stored
//! - **Whole-record upserts**: regeneration replaces value and timestamps at once

mod disk;
mod key_state;
mod storage;
mod summary_cache;
mod types;


pub use disk::DiskStore;
pub use storage::{MemoryStore, SummaryStore};
pub use summary_cache::SummaryCache;
pub use types::{
    CacheEntry, CacheStatistics, DEFAULT_SUMMARY_TTL, StoreBackend, SummaryCacheConfig,
};
