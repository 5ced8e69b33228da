//! Environment variable-based configuration
//!
//! `RECALL_*` variables override individual settings; the API key is also read
//! from the provider's standard `OPENAI_API_KEY`.

use super::model::Config;
use crate::cache::StoreBackend;
use crate::error::{RecallError, RecallResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Apply overrides from the process environment
pub fn apply_env(config: &mut Config) -> RecallResult<()> {
    apply_env_with(config, |name| std::env::var(name).ok())
}

/// Apply overrides read through `lookup`
pub fn apply_env_with<F>(config: &mut Config, lookup: F) -> RecallResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    // Generation
    if let Some(provider) = lookup("RECALL_PROVIDER") {
        config.generation.provider = parse_var("RECALL_PROVIDER", &provider)?;
    }
    if let Some(model) = lookup("RECALL_MODEL") {
        config.generation.model = model;
    }
    if let Some(temperature) = lookup("RECALL_TEMPERATURE") {
        config.generation.temperature = parse_var("RECALL_TEMPERATURE", &temperature)?;
    }
    if let Some(tokens) = lookup("RECALL_MAX_OUTPUT_TOKENS") {
        config.generation.max_output_tokens = parse_var("RECALL_MAX_OUTPUT_TOKENS", &tokens)?;
    }
    if let Some(base_url) = lookup("RECALL_BASE_URL").or_else(|| lookup("OPENAI_BASE_URL")) {
        config.generation.base_url = Some(base_url);
    }
    if let Some(api_key) = lookup("RECALL_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
        config.generation.api_key = Some(api_key);
    }

    // Summary cache
    if let Some(ttl) = lookup("RECALL_SUMMARY_TTL") {
        config.cache.ttl = parse_duration("RECALL_SUMMARY_TTL", &ttl)?;
    }
    if let Some(dir) = lookup("RECALL_CACHE_DIR") {
        config.cache.backend = StoreBackend::Disk {
            directory: PathBuf::from(dir),
        };
    }

    // Conversations
    if let Some(idle_ttl) = lookup("RECALL_CONVERSATION_IDLE_TTL") {
        config.conversations.idle_ttl = match idle_ttl.trim() {
            "off" | "none" => None,
            value => Some(parse_duration("RECALL_CONVERSATION_IDLE_TTL", value)?),
        };
    }
    if let Some(max) = lookup("RECALL_MAX_CONVERSATIONS") {
        config.conversations.max_conversations = parse_var("RECALL_MAX_CONVERSATIONS", &max)?;
    }

    // Chat
    if let Some(max) = lookup("RECALL_MAX_PROMPT_CHARS") {
        config.chat.max_prompt_chars = parse_var("RECALL_MAX_PROMPT_CHARS", &max)?;
    }

    // Logging
    if let Some(level) = lookup("RECALL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = lookup("RECALL_LOG_FORMAT") {
        config.logging.format = parse_var("RECALL_LOG_FORMAT", &format)?;
    }

    Ok(())
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> RecallResult<T> {
    value.trim().parse().map_err(|_| {
        RecallError::config_with_context(
            format!("Invalid {} value", name),
            format!("Parsing '{}'", value),
        )
    })
}

#[derive(Deserialize)]
struct HumanDuration(#[serde(with = "humantime_serde")] Duration);

fn parse_duration(name: &str, value: &str) -> RecallResult<Duration> {
    serde_json::from_value::<HumanDuration>(serde_json::Value::String(value.trim().to_string()))
        .map(|d| d.0)
        .map_err(|e| {
            RecallError::config_with_context(
                format!("Invalid {} value", name),
                format!("Parsing duration '{}': {}", value, e),
            )
        })
}
