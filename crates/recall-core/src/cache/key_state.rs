//! Per-key generation bookkeeping for the summary cache
//!
//! A key only has state while some call or flight holds an [`EpochLease`] on
//! it. Epochs are drawn from one counter shared by all keys, so a key whose
//! state was dropped and recreated never reuses an epoch a finishing flight
//! might still carry.

use crate::error::{RecallError, RecallResult};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

#[derive(Debug)]
struct KeyState {
    /// Replaced on every invalidation
    epoch: u64,
    leases: usize,
    /// Epoch whose generator is currently running
    generating: Option<u64>,
}

/// Epochs and running generations of the keys currently in use
#[derive(Debug, Default)]
pub(crate) struct KeyStates {
    states: DashMap<String, KeyState>,
    next_epoch: AtomicU64,
}

impl KeyStates {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pin the key's current epoch until the lease is dropped
    pub(crate) fn lease(self: &Arc<Self>, key: &str) -> EpochLease {
        let epoch = {
            let mut state = self
                .states
                .entry(key.to_string())
                .or_insert_with(|| KeyState {
                    epoch: self.fresh_epoch(),
                    leases: 0,
                    generating: None,
                });
            state.leases += 1;
            state.epoch
        };
        EpochLease {
            states: Arc::clone(self),
            key: key.to_string(),
            epoch,
        }
    }

    /// Move `key` to a new epoch; leases taken before keep the old one.
    ///
    /// A key nobody holds a lease on has nothing in flight to outdate.
    pub(crate) fn invalidate(&self, key: &str) {
        if let Some(mut state) = self.states.get_mut(key) {
            state.epoch = self.fresh_epoch();
        }
    }

    pub(crate) fn current_epoch(&self, key: &str) -> Option<u64> {
        self.states.get(key).map(|state| state.epoch)
    }

    /// Number of keys with live state
    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    fn fresh_epoch(&self) -> u64 {
        self.next_epoch.fetch_add(1, Ordering::Relaxed)
    }

    fn retain(&self, key: &str) {
        if let Some(mut state) = self.states.get_mut(key) {
            state.leases += 1;
        }
    }

    fn release(&self, key: &str) {
        if let Some(mut state) = self.states.get_mut(key) {
            state.leases = state.leases.saturating_sub(1);
        }
        self.states.remove_if(key, |_, state| state.leases == 0);
    }
}

/// Keeps a key's state alive and remembers the epoch it was taken in
#[derive(Debug)]
pub(crate) struct EpochLease {
    states: Arc<KeyStates>,
    key: String,
    epoch: u64,
}

impl EpochLease {
    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the key was not invalidated since the lease was taken
    pub(crate) fn is_current(&self) -> bool {
        self.states.current_epoch(&self.key) == Some(self.epoch)
    }

    /// Record that the generator for this key and epoch is running.
    ///
    /// A second generator for the same key and epoch is a
    /// [`RecallError::ConcurrencyViolation`]. Generators of an invalidated
    /// epoch may overlap with the current one; the current one owns the slot.
    pub(crate) fn begin_generation(&self) -> RecallResult<GenerationSlot<'_>> {
        if let Some(mut state) = self.states.states.get_mut(&self.key) {
            match state.generating {
                Some(running) if running == self.epoch => {
                    error!(
                        "A generation for '{}' is already running in epoch {}",
                        self.key, self.epoch
                    );
                    return Err(RecallError::concurrency_violation(self.key.clone()));
                }
                Some(_) if self.epoch != state.epoch => {}
                _ => state.generating = Some(self.epoch),
            }
        }
        Ok(GenerationSlot { lease: self })
    }
}

impl Clone for EpochLease {
    fn clone(&self) -> Self {
        self.states.retain(&self.key);
        Self {
            states: Arc::clone(&self.states),
            key: self.key.clone(),
            epoch: self.epoch,
        }
    }
}

impl Drop for EpochLease {
    fn drop(&mut self) {
        self.states.release(&self.key);
    }
}

/// Marks a running generator; cleared on drop
#[derive(Debug)]
pub(crate) struct GenerationSlot<'a> {
    lease: &'a EpochLease,
}

impl Drop for GenerationSlot<'_> {
    fn drop(&mut self) {
        let lease = self.lease;
        if let Some(mut state) = lease.states.states.get_mut(&lease.key) {
            if state.generating == Some(lease.epoch) {
                state.generating = None;
            }
        }
    }
}
