//! Conversation continuity
//!
//! Tracks, per conversation, the continuation token returned by the provider's
//! most recently completed turn, so the next turn can be generated with
//! provider-side context instead of resending the whole history.
//!
//! ## How it works
//!
//! 1. Before a turn, look up the conversation's token (absent on the first turn)
//! 2. Generate the turn, passing the token along
//! 3. Record the token the provider returned for this turn
//!
//! [`ConversationRegistry::begin_turn`] wraps the three steps and queues
//! concurrent turns of the same conversation behind each other.

mod eviction;
mod registry;
mod types;


pub use registry::{ConversationRegistry, Turn};
pub use types::{
    ConversationRegistryConfig, ConversationState, ConversationStats, DEFAULT_IDLE_TTL,
    DEFAULT_MAX_CONVERSATIONS,
};
