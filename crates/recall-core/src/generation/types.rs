//! Generation request/response types and the generator trait

use crate::error::RecallResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature used when none is configured
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Output token limit used when none is configured
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;

/// One call to the external generation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// User input for this turn
    pub prompt: String,
    /// System-level instructions
    pub instructions: Option<String>,
    /// Token of the previous turn; `None` starts a fresh context
    pub continuation_token: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// Create a request with default model parameters
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            instructions: None,
            continuation_token: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Continue from a previous turn (no-op for `None`)
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// Provider answer for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub text: String,
    /// Provider id of this response, usable as the next continuation token
    pub response_id: String,
}

/// External generation provider
///
/// Calls may be slow and may fail transiently. Implementations must accept a
/// request without a continuation token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a response for the request
    async fn generate(&self, request: GenerationRequest) -> RecallResult<GenerationResponse>;
}
