//! Core types for conversation tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Conversations idle for longer than this are dropped by cleanup (24 hours)
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Maximum number of tracked conversations
pub const DEFAULT_MAX_CONVERSATIONS: usize = 10_000;

/// Configuration for the conversation registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationRegistryConfig {
    /// Drop conversations with no activity for this long (`None` keeps them)
    #[serde(with = "humantime_serde")]
    pub idle_ttl: Option<Duration>,
    /// Maximum number of tracked conversations
    pub max_conversations: usize,
}

impl Default for ConversationRegistryConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Some(DEFAULT_IDLE_TTL),
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
        }
    }
}

/// Continuation state of one conversation
///
/// Serialized with the field names of the persisted record layout:
/// `{conversationId, lastResponseId}` plus activity metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    /// Externally supplied conversation id
    pub conversation_id: String,
    /// Token of the most recently completed turn
    pub last_response_id: Option<String>,
    /// Number of completed turns
    pub turn_count: u64,
    /// When the conversation was first seen
    pub created_at: DateTime<Utc>,
    /// Last lookup or update
    pub last_active: DateTime<Utc>,
}

impl ConversationState {
    /// Create state for a conversation that has not completed a turn yet
    pub fn new(conversation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            last_response_id: None,
            turn_count: 0,
            created_at: now,
            last_active: now,
        }
    }

    /// Mark the conversation as active
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Record the token of a completed turn
    pub fn record_turn(&mut self, token: String) {
        self.last_response_id = Some(token);
        self.turn_count += 1;
        self.touch();
    }

    /// Whether the conversation has been idle longer than `idle_ttl` at `now`
    pub fn is_idle(&self, idle_ttl: Duration, now: DateTime<Utc>) -> bool {
        let idle_ttl = chrono::Duration::from_std(idle_ttl).unwrap_or(chrono::Duration::MAX);
        now.signed_duration_since(self.last_active) > idle_ttl
    }
}

/// Statistics for the conversation registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationStats {
    /// Token lookups
    pub lookups: u64,
    /// Lookups for conversations without a completed turn
    pub first_turns: u64,
    /// Token updates
    pub updates: u64,
    /// Conversations dropped by idle cleanup or capacity eviction
    pub evictions: u64,
    /// Conversations currently tracked
    pub active_conversations: usize,
}
