//! Generation provider configuration

use super::echo::EchoGenerator;
use super::openai::OpenAiResponsesGenerator;
use super::retry::{RetryConfig, RetryingGenerator};
use super::types::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationRequest, Generator,
};
use crate::error::RecallResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Which generator to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted Responses API
    #[default]
    OpenAi,
    /// Offline echo generator
    Echo,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Echo => write!(f, "echo"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "echo" | "offline" => Ok(ProviderKind::Echo),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// Settings for the generation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// API key; usually taken from `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Override for the API base URL
    pub base_url: Option<String>,
    pub organization: Option<String>,
    /// Per-request HTTP timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            api_key: None,
            base_url: None,
            organization: None,
            request_timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
        }
    }
}

impl GenerationConfig {
    /// Request for `prompt` with the configured model parameters
    pub fn request(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(prompt)
            .with_model(self.model.clone())
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens)
    }

    /// API key with everything but the last four characters hidden
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(|key| {
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("****{}", tail)
        })
    }

    /// Build the configured generator, wrapped in the retry policy
    pub fn build_generator(&self) -> RecallResult<Arc<dyn Generator>> {
        Ok(match self.provider {
            ProviderKind::OpenAi => Arc::new(RetryingGenerator::new(
                OpenAiResponsesGenerator::from_config(self)?,
                self.retry.clone(),
            )),
            ProviderKind::Echo => Arc::new(EchoGenerator::new()),
        })
    }
}
