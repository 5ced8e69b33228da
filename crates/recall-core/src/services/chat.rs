//! Multi-turn chat on top of the conversation registry

use crate::conversation::ConversationRegistry;
use crate::error::{RecallError, RecallResult};
use crate::generation::{GenerationConfig, Generator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Chat settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Longest accepted prompt, in characters after trimming
    pub max_prompt_chars: usize,
    /// Output token limit for chat turns
    pub max_output_tokens: u32,
    /// System instructions sent with every turn
    pub instructions: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: 100,
            max_output_tokens: 200,
            instructions: None,
        }
    }
}

/// Answer to one chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Provider id of this turn
    pub id: String,
    pub message: String,
}

/// Sends chat messages, threading each conversation's continuation token
pub struct ChatService {
    generator: Arc<dyn Generator>,
    registry: Arc<ConversationRegistry>,
    generation: GenerationConfig,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(
        generator: Arc<dyn Generator>,
        registry: Arc<ConversationRegistry>,
        generation: GenerationConfig,
        config: ChatConfig,
    ) -> Self {
        Self {
            generator,
            registry,
            generation,
            config,
        }
    }

    /// The registry holding this service's conversations
    pub fn registry(&self) -> &Arc<ConversationRegistry> {
        &self.registry
    }

    /// Send `prompt` as the next turn of `conversation_id`.
    ///
    /// Turns of one conversation run one at a time. A failed turn leaves the
    /// conversation's token unchanged, so the next message continues from the
    /// last successful one.
    #[instrument(skip(self, prompt), level = "debug")]
    pub async fn send_message(&self, prompt: &str, conversation_id: &str) -> RecallResult<ChatReply> {
        let prompt = self.validate_prompt(prompt)?;
        let turn = self.registry.begin_turn(conversation_id).await?;

        let mut request = self
            .generation
            .request(prompt)
            .with_max_output_tokens(self.config.max_output_tokens)
            .with_continuation_token(turn.continuation_token().map(str::to_string));
        if let Some(instructions) = &self.config.instructions {
            request = request.with_instructions(instructions.clone());
        }

        let response = self
            .generator
            .generate(request)
            .await
            .map_err(|e| e.into_generation(conversation_id))?;

        turn.complete(response.response_id.clone())?;
        debug!(
            "Conversation {} advanced to {}",
            conversation_id, response.response_id
        );

        Ok(ChatReply {
            id: response.response_id,
            message: response.text,
        })
    }

    fn validate_prompt<'a>(&self, prompt: &'a str) -> RecallResult<&'a str> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(RecallError::invalid_input_field(
                "Prompt cannot be empty",
                "prompt",
            ));
        }
        if prompt.chars().count() > self.config.max_prompt_chars {
            return Err(RecallError::invalid_input_field(
                format!(
                    "Prompt is too long, max {} characters",
                    self.config.max_prompt_chars
                ),
                "prompt",
            ));
        }
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{GenerationResponse, MockGenerator};
    use mockall::predicate::function;
    use mockall::Sequence;

    fn service(generator: MockGenerator, config: ChatConfig) -> ChatService {
        ChatService::new(
            Arc::new(generator),
            Arc::new(ConversationRegistry::default()),
            GenerationConfig::default(),
            config,
        )
    }

    fn reply(id: &str, text: &str) -> GenerationResponse {
        GenerationResponse {
            text: text.to_string(),
            response_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_turns_chain_continuation_tokens() {
        let mut generator = MockGenerator::new();
        let mut seq = Sequence::new();
        generator
            .expect_generate()
            .with(function(|r: &crate::generation::GenerationRequest| {
                r.continuation_token.is_none() && r.prompt == "When do you open?"
            }))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(reply("tok-A", "At 8am.")));
        generator
            .expect_generate()
            .with(function(|r: &crate::generation::GenerationRequest| {
                r.continuation_token.as_deref() == Some("tok-A")
            }))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(reply("tok-B", "Until 6pm.")));

        let chat = service(generator, ChatConfig::default());

        let first = chat
            .send_message("  When do you open?  ", "conv-1")
            .await
            .unwrap();
        assert_eq!(first.id, "tok-A");
        assert_eq!(first.message, "At 8am.");

        let second = chat.send_message("And close?", "conv-1").await.unwrap();
        assert_eq!(second.id, "tok-B");
        assert_eq!(
            chat.registry()
                .get_continuation_token("conv-1")
                .unwrap()
                .as_deref(),
            Some("tok-B")
        );
    }

    #[tokio::test]
    async fn test_request_carries_chat_settings() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|r| {
                r.max_output_tokens == 200
                    && r.instructions.as_deref() == Some("You are a park guide.")
                    && r.model == "gpt-4o-mini"
            })
            .times(1)
            .returning(|_| Ok(reply("tok-1", "Hi!")));

        let config = ChatConfig {
            instructions: Some("You are a park guide.".to_string()),
            ..Default::default()
        };
        let chat = service(generator, config);
        chat.send_message("hello", "conv-9").await.unwrap();
    }

    #[tokio::test]
    async fn test_prompt_validation() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().never();
        let chat = service(generator, ChatConfig::default());

        assert!(matches!(
            chat.send_message("   ", "conv-1").await,
            Err(RecallError::InvalidInput { .. })
        ));
        let long = "x".repeat(101);
        assert!(matches!(
            chat.send_message(&long, "conv-1").await,
            Err(RecallError::InvalidInput { .. })
        ));
        assert!(matches!(
            chat.send_message("hello", "").await,
            Err(RecallError::InvalidKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_previous_token() {
        let mut generator = MockGenerator::new();
        let mut seq = Sequence::new();
        generator
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(reply("tok-A", "first")));
        generator
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(RecallError::http_status("overloaded", 503)));
        generator
            .expect_generate()
            .withf(|r| r.continuation_token.as_deref() == Some("tok-A"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(reply("tok-C", "third")));

        let chat = service(generator, ChatConfig::default());
        chat.send_message("one", "conv-1").await.unwrap();

        let error = chat.send_message("two", "conv-1").await.unwrap_err();
        assert!(matches!(
            error,
            RecallError::Generation {
                retryable: true,
                ..
            }
        ));

        let third = chat.send_message("three", "conv-1").await.unwrap();
        assert_eq!(third.id, "tok-C");
    }

    #[tokio::test]
    async fn test_long_response_ids_are_kept() {
        let long_id = format!("resp_{}", "a".repeat(300));
        let mut generator = MockGenerator::new();
        let mut seq = Sequence::new();
        let returned = long_id.clone();
        generator
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(reply(&returned, "first")));
        let expected = long_id.clone();
        generator
            .expect_generate()
            .withf(move |r| r.continuation_token.as_deref() == Some(expected.as_str()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(reply("tok-B", "second")));

        let chat = service(generator, ChatConfig::default());
        let first = chat.send_message("one", "conv-1").await.unwrap();
        assert_eq!(first.id, long_id);
        assert_eq!(first.message, "first");

        let second = chat.send_message("two", "conv-1").await.unwrap();
        assert_eq!(second.id, "tok-B");
    }
}
