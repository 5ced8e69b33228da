//! Configuration model

use super::logging::LoggingConfig;
use crate::cache::SummaryCacheConfig;
use crate::conversation::ConversationRegistryConfig;
use crate::error::{RecallError, RecallResult};
use crate::generation::GenerationConfig;
use crate::services::{ChatConfig, ReviewSummaryConfig};
use serde::{Deserialize, Serialize};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: SummaryCacheConfig,
    pub conversations: ConversationRegistryConfig,
    pub generation: GenerationConfig,
    pub chat: ChatConfig,
    pub reviews: ReviewSummaryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Check the configuration for values the components would reject
    pub fn validate(&self) -> RecallResult<()> {
        if self.cache.ttl.is_zero() {
            return Err(RecallError::config("cache.ttl must be greater than zero"));
        }
        if self.conversations.max_conversations == 0 {
            return Err(RecallError::config(
                "conversations.max_conversations must be greater than zero",
            ));
        }
        if matches!(self.conversations.idle_ttl, Some(ttl) if ttl.is_zero()) {
            return Err(RecallError::config(
                "conversations.idle_ttl must be greater than zero; omit it to keep conversations",
            ));
        }
        if self.generation.model.trim().is_empty() {
            return Err(RecallError::config("generation.model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(RecallError::config(format!(
                "generation.temperature must be between 0 and 2, got {}",
                self.generation.temperature
            )));
        }
        if self.generation.max_output_tokens == 0 {
            return Err(RecallError::config(
                "generation.max_output_tokens must be greater than zero",
            ));
        }
        if self.generation.retry.max_attempts == 0 {
            return Err(RecallError::config(
                "generation.retry.max_attempts must be at least 1",
            ));
        }
        if self.chat.max_prompt_chars == 0 {
            return Err(RecallError::config(
                "chat.max_prompt_chars must be greater than zero",
            ));
        }
        if self.chat.max_output_tokens == 0 {
            return Err(RecallError::config(
                "chat.max_output_tokens must be greater than zero",
            ));
        }
        if self.reviews.review_limit == 0 {
            return Err(RecallError::config(
                "reviews.review_limit must be greater than zero",
            ));
        }
        if !self.logging.has_valid_level() {
            return Err(RecallError::config(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }
}
