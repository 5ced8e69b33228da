//! Recall Core Library
//!
//! Generation cache and conversation continuity for services that call a slow,
//! possibly failing text generation provider:
//!
//! - [`SummaryCache`] memoizes generated artifacts by subject key with a
//!   time-to-live and runs at most one generation per key at a time.
//! - [`ConversationRegistry`] remembers the continuation token of each
//!   conversation's latest turn so the next turn can pick up where it left off.
//!
//! Both are plain values meant to be constructed once and shared by `Arc`.

pub mod cache;
pub mod concurrency;
pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod services;
pub mod validation;

// Re-export commonly used types
pub use cache::{CacheEntry, CacheStatistics, SummaryCache, SummaryCacheConfig, SummaryStore};
pub use config::{Config, ConfigLoader};
pub use conversation::{ConversationRegistry, ConversationRegistryConfig, Turn};
pub use error::{ErrorCategory, RecallError, RecallResult, UnifiedError};
pub use generation::{GenerationRequest, GenerationResponse, Generator};
pub use services::{ChatReply, ChatService, ReviewSummarizer};
