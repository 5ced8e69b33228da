//! OpenAI Responses API generator

use super::config::GenerationConfig;
use super::types::{GenerationRequest, GenerationResponse, Generator};
use crate::error::{RecallError, RecallResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::instrument;

/// Default API endpoint
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Generator backed by the hosted Responses endpoint.
///
/// The continuation token is sent as `previous_response_id`, so the provider
/// keeps the conversation context and only the new prompt travels per turn.
#[derive(Debug, Clone)]
pub struct OpenAiResponsesGenerator {
    api_key: Option<String>,
    base_url: String,
    organization: Option<String>,
    /// Timeout the HTTP client was built with, reported on timed-out requests
    request_timeout: Option<Duration>,
    http_client: Client,
}

impl OpenAiResponsesGenerator {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, http_client: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            organization: None,
            request_timeout: None,
            http_client,
        }
    }

    /// Build a generator from configuration, with its own HTTP client
    pub fn from_config(config: &GenerationConfig) -> RecallResult<Self> {
        if config.api_key.is_none() {
            return Err(RecallError::config_with_context(
                "OpenAI API key is not set",
                "set OPENAI_API_KEY or generation.api_key",
            ));
        }
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RecallError::config(format!("Failed to build HTTP client: {}", e)))?;

        let mut generator = Self::new(
            config.api_key.clone(),
            config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            http_client,
        );
        generator.organization = config.organization.clone();
        generator.request_timeout = Some(config.request_timeout);
        Ok(generator)
    }

    fn request_body(request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "input": request.prompt,
            "temperature": request.temperature,
            "max_output_tokens": request.max_output_tokens,
        });
        if let Some(instructions) = &request.instructions {
            body["instructions"] = json!(instructions);
        }
        if let Some(token) = &request.continuation_token {
            body["previous_response_id"] = json!(token);
        }
        body
    }

    fn transport_error(&self, error: reqwest::Error) -> RecallError {
        match self.request_timeout {
            Some(timeout) if error.is_timeout() => RecallError::timeout(timeout.as_secs()),
            _ => error.into(),
        }
    }

    /// Extract the response id and the concatenated output text
    fn parse_response(body: &Value) -> RecallResult<GenerationResponse> {
        let response_id = body["id"]
            .as_str()
            .ok_or_else(|| RecallError::json("Responses API reply has no id"))?
            .to_string();

        if let Some(text) = body["output_text"].as_str() {
            return Ok(GenerationResponse {
                text: text.to_string(),
                response_id,
            });
        }

        let text: String = body["output"]
            .as_array()
            .into_iter()
            .flatten()
            .filter(|item| item["type"] == "message")
            .filter_map(|item| item["content"].as_array())
            .flatten()
            .filter(|part| part["type"] == "output_text")
            .filter_map(|part| part["text"].as_str())
            .collect();

        if text.is_empty() && body["status"] == "incomplete" {
            let reason = body["incomplete_details"]["reason"]
                .as_str()
                .unwrap_or("unknown");
            return Err(RecallError::http(format!(
                "Response {} is incomplete: {}",
                response_id, reason
            )));
        }

        Ok(GenerationResponse { text, response_id })
    }
}

#[async_trait]
impl Generator for OpenAiResponsesGenerator {
    #[instrument(skip(self, request), fields(model = %request.model), level = "debug")]
    async fn generate(&self, request: GenerationRequest) -> RecallResult<GenerationResponse> {
        let url = format!("{}/responses", self.base_url);

        let mut http_request = self
            .http_client
            .post(&url)
            .json(&Self::request_body(&request));
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }
        if let Some(org) = &self.organization {
            http_request = http_request.header("OpenAI-Organization", org);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecallError::Http {
                message: format!("Responses API error (status {}): {}", status, error_text),
                url: Some(url),
                status_code: Some(status.as_u16()),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::parse_response(&body)
    }
}
