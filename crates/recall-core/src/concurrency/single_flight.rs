//! Single-flight execution keyed by an arbitrary key

use crate::error::{RecallError, RecallResult};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

type Outcome<V> = Option<RecallResult<V>>;

#[derive(Debug)]
struct Flight<V> {
    id: u64,
    outcome: watch::Receiver<Outcome<V>>,
}

/// Counters describing how calls were coalesced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleFlightStats {
    /// Operations actually started
    pub started: u64,
    /// Calls that attached to an operation already in flight
    pub joined: u64,
    /// Operations currently running
    pub in_flight: usize,
}

/// Collapses concurrent calls for the same key into one operation.
///
/// The first caller for a key becomes the leader: its operation is spawned onto
/// the tokio runtime and every caller (leader included) awaits the shared
/// outcome. Because the operation runs on its own task, dropping any caller's
/// future (timeout, client disconnect) never cancels it; it still completes for
/// the remaining callers and for whatever side effects it performs.
///
/// The flight for a key is removed only after the operation finished, so a
/// caller arriving later either joins the flight or observes its side effects.
///
/// # Example
///
/// ```rust
/// use recall_core::concurrency::SingleFlight;
///
/// #[tokio::main]
/// async fn main() {
///     let flights: SingleFlight<String, String> = SingleFlight::new();
///     let value = flights
///         .run("product-42".to_string(), || async { Ok("great product".to_string()) })
///         .await
///         .unwrap();
///     assert_eq!(value, "great product");
/// }
/// ```
#[derive(Debug)]
pub struct SingleFlight<K, V>
where
    K: Eq + Hash,
{
    flights: Arc<DashMap<K, Flight<V>>>,
    next_id: AtomicU64,
    started: AtomicU64,
    joined: AtomicU64,
}

enum Role<V> {
    Leader {
        id: u64,
        sender: watch::Sender<Outcome<V>>,
        outcome: watch::Receiver<Outcome<V>>,
    },
    Follower {
        outcome: watch::Receiver<Outcome<V>>,
    },
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty single-flight group
    pub fn new() -> Self {
        Self {
            flights: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            started: AtomicU64::new(0),
            joined: AtomicU64::new(0),
        }
    }

    /// Whether an operation for `key` is currently in flight
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.flights.contains_key(key)
    }

    /// Get coalescing counters
    pub fn stats(&self) -> SingleFlightStats {
        SingleFlightStats {
            started: self.started.load(Ordering::Relaxed),
            joined: self.joined.load(Ordering::Relaxed),
            in_flight: self.flights.len(),
        }
    }

    /// Run `work` for `key`, or join the run already in flight.
    ///
    /// `work` is only invoked when this call becomes the leader. Every caller
    /// of the same flight receives a clone of the same outcome, including the
    /// same error. Must be called from within a tokio runtime.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> RecallResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RecallResult<V>> + Send + 'static,
    {
        let role = match self.flights.entry(key.clone()) {
            Entry::Occupied(entry) => Role::Follower {
                outcome: entry.get().outcome.clone(),
            },
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (sender, outcome) = watch::channel(None);
                entry.insert(Flight {
                    id,
                    outcome: outcome.clone(),
                });
                Role::Leader {
                    id,
                    sender,
                    outcome,
                }
            }
        };

        let mut outcome = match role {
            Role::Follower { outcome } => {
                drop(work);
                self.joined.fetch_add(1, Ordering::Relaxed);
                debug!("Joining in-flight operation for '{}'", key);
                outcome
            }
            Role::Leader {
                id,
                sender,
                outcome,
            } => {
                self.started.fetch_add(1, Ordering::Relaxed);
                debug!("Starting operation {} for '{}'", id, key);
                self.spawn_leader(key.clone(), id, sender, work());
                outcome
            }
        };

        match outcome.wait_for(Option::is_some).await {
            Ok(resolved) => {
                let resolved: Outcome<V> = (*resolved).clone();
                resolved.unwrap_or_else(|| {
                    Err(RecallError::generation(
                        key.to_string(),
                        "operation resolved without an outcome",
                    ))
                })
            }
            Err(_) => Err(RecallError::generation(
                key.to_string(),
                "operation task ended without producing an outcome",
            )),
        }
    }

    fn spawn_leader<Fut>(&self, key: K, id: u64, sender: watch::Sender<Outcome<V>>, work: Fut)
    where
        Fut: Future<Output = RecallResult<V>> + Send + 'static,
    {
        let guard = FlightGuard {
            flights: Arc::clone(&self.flights),
            key,
            id,
        };

        tokio::spawn(async move {
            let result = work.await;

            // Unregister before publishing so that later callers observe the
            // operation's side effects instead of a finished flight.
            drop(guard);
            sender.send_replace(Some(result));
        });
    }
}

/// Unregisters a flight when its task finishes, including by panic
struct FlightGuard<K, V>
where
    K: Eq + Hash,
{
    flights: Arc<DashMap<K, Flight<V>>>,
    key: K,
    id: u64,
}

impl<K, V> Drop for FlightGuard<K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let id = self.id;
        self.flights.remove_if(&self.key, |_, flight| flight.id == id);
    }
}
