//! Conversation registry operations

use super::eviction::{evict_idle, evict_least_recent};
use super::types::{ConversationRegistryConfig, ConversationState, ConversationStats};
use crate::concurrency::{KeyedGuard, KeyedMutex};
use crate::error::{RecallError, RecallResult};
use crate::validation::validate_key;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Default)]
struct Counters {
    lookups: AtomicU64,
    first_turns: AtomicU64,
    updates: AtomicU64,
    evictions: AtomicU64,
}

/// Maps conversation ids to the continuation token of their latest turn.
///
/// Every operation on one conversation is applied atomically on that
/// conversation's map shard, so a token set by one turn is visible to the
/// lookup that starts the next. Conversations never block each other.
///
/// An unseen conversation id is not an error: its token is simply absent and
/// the conversation starts being tracked.
#[derive(Debug)]
pub struct ConversationRegistry {
    config: ConversationRegistryConfig,
    conversations: DashMap<String, ConversationState>,
    turn_locks: KeyedMutex<String>,
    counters: Counters,
}

impl ConversationRegistry {
    /// Create a new registry
    pub fn new(config: ConversationRegistryConfig) -> RecallResult<Self> {
        if config.max_conversations == 0 {
            return Err(RecallError::config(
                "max_conversations must be greater than zero",
            ));
        }
        Ok(Self {
            config,
            conversations: DashMap::new(),
            turn_locks: KeyedMutex::new(),
            counters: Counters::default(),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &ConversationRegistryConfig {
        &self.config
    }

    /// Token from the conversation's most recently completed turn.
    ///
    /// Returns `None` for the first turn of a conversation.
    pub fn get_continuation_token(&self, conversation_id: &str) -> RecallResult<Option<String>> {
        validate_key("conversation_id", conversation_id)?;
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);

        let (token, created) = {
            let mut created = false;
            let mut state = self
                .conversations
                .entry(conversation_id.to_string())
                .or_insert_with(|| {
                    created = true;
                    ConversationState::new(conversation_id)
                });
            state.touch();
            (state.last_response_id.clone(), created)
        };

        if token.is_none() {
            self.counters.first_turns.fetch_add(1, Ordering::Relaxed);
        }
        if created {
            debug!("Tracking new conversation {}", conversation_id);
            self.enforce_capacity();
        }
        Ok(token)
    }

    /// Overwrite the conversation's token (last writer wins).
    ///
    /// The token is opaque: any non-empty string the provider returned is kept
    /// as is.
    pub fn set_continuation_token(
        &self,
        conversation_id: &str,
        token: impl Into<String>,
    ) -> RecallResult<()> {
        validate_key("conversation_id", conversation_id)?;
        let token = token.into();
        if token.is_empty() {
            return Err(RecallError::invalid_input_field(
                "continuation token must not be empty",
                "continuation_token",
            ));
        }

        let created = {
            let mut created = false;
            let mut state = self
                .conversations
                .entry(conversation_id.to_string())
                .or_insert_with(|| {
                    created = true;
                    ConversationState::new(conversation_id)
                });
            state.record_turn(token);
            created
        };
        self.counters.updates.fetch_add(1, Ordering::Relaxed);

        if created {
            self.enforce_capacity();
        }
        Ok(())
    }

    /// Start a turn, waiting for any turn in progress on the same conversation.
    ///
    /// The returned [`Turn`] carries the token to send to the provider. Call
    /// [`Turn::complete`] with the provider's new token once the turn
    /// succeeded; dropping the turn instead leaves the previous token in place.
    pub async fn begin_turn(&self, conversation_id: &str) -> RecallResult<Turn<'_>> {
        validate_key("conversation_id", conversation_id)?;
        let guard = self.turn_locks.lock(conversation_id.to_string()).await;
        let continuation_token = self.get_continuation_token(conversation_id)?;

        Ok(Turn {
            registry: self,
            continuation_token,
            guard,
        })
    }

    /// Current state of a conversation, without touching it
    pub fn snapshot(&self, conversation_id: &str) -> Option<ConversationState> {
        self.conversations
            .get(conversation_id)
            .map(|state| state.clone())
    }

    /// Drop conversations idle for longer than the configured idle TTL
    pub fn cleanup_idle(&self) -> usize {
        let Some(idle_ttl) = self.config.idle_ttl else {
            return 0;
        };
        let removed = evict_idle(&self.conversations, idle_ttl, Utc::now());
        if removed > 0 {
            self.counters
                .evictions
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!("Dropped {} idle conversations", removed);
        }
        removed
    }

    /// Number of tracked conversations
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }

    /// Get registry statistics
    pub fn statistics(&self) -> ConversationStats {
        ConversationStats {
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            first_turns: self.counters.first_turns.load(Ordering::Relaxed),
            updates: self.counters.updates.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            active_conversations: self.conversations.len(),
        }
    }

    fn enforce_capacity(&self) {
        if self.conversations.len() <= self.config.max_conversations {
            return;
        }
        let removed = evict_least_recent(&self.conversations);
        self.counters
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
        debug!(
            "Conversation capacity {} exceeded; evicted {}",
            self.config.max_conversations, removed
        );
    }
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self {
            config: ConversationRegistryConfig::default(),
            conversations: DashMap::new(),
            turn_locks: KeyedMutex::new(),
            counters: Counters::default(),
        }
    }
}

/// One in-progress turn of a conversation
///
/// Holds the conversation's turn lock until completed or dropped.
#[derive(Debug)]
pub struct Turn<'a> {
    registry: &'a ConversationRegistry,
    continuation_token: Option<String>,
    guard: KeyedGuard<String>,
}

impl Turn<'_> {
    /// Conversation this turn belongs to
    pub fn conversation_id(&self) -> &str {
        self.guard.key()
    }

    /// Token to hand to the provider (`None` on the first turn)
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    /// Record the provider's token for this turn and release the conversation
    pub fn complete(self, new_token: impl Into<String>) -> RecallResult<()> {
        self.registry
            .set_continuation_token(self.conversation_id(), new_token)
    }
}
