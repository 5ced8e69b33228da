//! Conversation eviction policies

use super::types::ConversationState;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Remove the least recently active conversations when at capacity
///
/// Drops the oldest 10% (at least one) and returns how many were removed.
pub fn evict_least_recent(conversations: &DashMap<String, ConversationState>) -> usize {
    let mut by_activity: Vec<(String, DateTime<Utc>)> = conversations
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().last_active))
        .collect();
    by_activity.sort_by(|a, b| a.1.cmp(&b.1));

    let to_remove = (by_activity.len() / 10).max(1);
    by_activity
        .into_iter()
        .take(to_remove)
        .filter(|(id, _)| conversations.remove(id).is_some())
        .count()
}

/// Remove conversations idle for longer than `idle_ttl`
pub fn evict_idle(
    conversations: &DashMap<String, ConversationState>,
    idle_ttl: Duration,
    now: DateTime<Utc>,
) -> usize {
    let before = conversations.len();
    conversations.retain(|_, state| !state.is_idle(idle_ttl, now));
    before.saturating_sub(conversations.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_active_at(id: &str, last_active: DateTime<Utc>) -> ConversationState {
        let mut state = ConversationState::new(id);
        state.last_active = last_active;
        state
    }

    #[test]
    fn test_evict_least_recent_drops_oldest() {
        let conversations = DashMap::new();
        let now = Utc::now();
        for i in 0..20 {
            let id = format!("conv-{i}");
            conversations.insert(
                id.clone(),
                state_active_at(&id, now - chrono::Duration::minutes(60 - i)),
            );
        }

        assert_eq!(evict_least_recent(&conversations), 2);
        assert!(!conversations.contains_key("conv-0"));
        assert!(!conversations.contains_key("conv-1"));
        assert!(conversations.contains_key("conv-2"));
    }

    #[test]
    fn test_evict_least_recent_removes_at_least_one() {
        let conversations = DashMap::new();
        conversations.insert("only".to_string(), ConversationState::new("only"));
        assert_eq!(evict_least_recent(&conversations), 1);
        assert!(conversations.is_empty());
    }

    #[test]
    fn test_evict_idle() {
        let conversations = DashMap::new();
        let now = Utc::now();
        conversations.insert(
            "stale".to_string(),
            state_active_at("stale", now - chrono::Duration::hours(2)),
        );
        conversations.insert("fresh".to_string(), state_active_at("fresh", now));

        assert_eq!(evict_idle(&conversations, Duration::from_secs(3600), now), 1);
        assert!(conversations.contains_key("fresh"));
    }
}
