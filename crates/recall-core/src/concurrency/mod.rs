//! Concurrency primitives shared by the summary cache and the conversation registry
//!
//! Both primitives scope their synchronization to a single key, so requests for
//! different keys never wait on each other:
//!
//! - [`SingleFlight`] collapses concurrent requests for the same key into one
//!   underlying operation and hands its result to every caller.
//! - [`KeyedMutex`] serializes critical sections that share a key.

mod keyed_lock;
mod single_flight;

pub use keyed_lock::{KeyedGuard, KeyedMutex};
pub use single_flight::{SingleFlight, SingleFlightStats};
