//! Offline generator

use super::types::{GenerationRequest, GenerationResponse, Generator};
use crate::error::RecallResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generator that answers without calling a provider.
///
/// Replies echo the prompt and report how many turns preceded it, so the
/// continuation chain is visible in demos and tests. Response ids are
/// `echo-1`, `echo-2`, ...
#[derive(Debug, Default)]
pub struct EchoGenerator {
    issued: AtomicU64,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, request: GenerationRequest) -> RecallResult<GenerationResponse> {
        let id = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let text = match &request.continuation_token {
            Some(previous) => format!("(after {}) {}", previous, request.prompt),
            None => request.prompt.clone(),
        };
        Ok(GenerationResponse {
            text,
            response_id: format!("echo-{}", id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_chains_ids() {
        let generator = EchoGenerator::new();

        let first = generator
            .generate(GenerationRequest::new("hello"))
            .await
            .unwrap();
        assert_eq!(first.text, "hello");
        assert_eq!(first.response_id, "echo-1");

        let second = generator
            .generate(
                GenerationRequest::new("again")
                    .with_continuation_token(Some(first.response_id.clone())),
            )
            .await
            .unwrap();
        assert_eq!(second.text, "(after echo-1) again");
        assert_eq!(second.response_id, "echo-2");
    }
}
