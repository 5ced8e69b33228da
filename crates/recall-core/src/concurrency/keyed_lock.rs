//! Per-key async mutual exclusion

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A set of async mutexes, one per key, created on demand.
///
/// Holding the guard for one key never blocks callers locking another key.
/// Idle lock slots are dropped once the last holder or waiter releases them.
#[derive(Debug)]
pub struct KeyedMutex<K>
where
    K: Eq + Hash,
{
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedMutex<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KeyedMutex<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Acquire the lock for `key`, waiting for the current holder if any
    pub async fn lock(&self, key: K) -> KeyedGuard<K> {
        // Clone the slot under the shard lock so cleanup can see us waiting.
        let slot = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = slot.lock_owned().await;
        KeyedGuard {
            locks: Arc::clone(&self.locks),
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys with a holder or waiter
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }
}

/// Guard for one key of a [`KeyedMutex`]
#[derive(Debug)]
pub struct KeyedGuard<K>
where
    K: Eq + Hash,
{
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> KeyedGuard<K>
where
    K: Eq + Hash,
{
    /// The key this guard holds
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K> Drop for KeyedGuard<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map still references the slot: nobody holds or waits on it.
        self.locks
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}
