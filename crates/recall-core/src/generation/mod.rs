//! Generation adapter
//!
//! The external provider behind the summary cache and the chat service:
//! a [`Generator`] trait, a client for the hosted Responses API, a retrying
//! wrapper and an offline generator.

mod backoff;
mod config;
mod echo;
mod openai;
mod retry;
mod types;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use config::{GenerationConfig, ProviderKind};
pub use echo::EchoGenerator;
pub use openai::{DEFAULT_OPENAI_BASE_URL, OpenAiResponsesGenerator};
pub use retry::{RetryConfig, RetryingGenerator};
pub use types::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationRequest,
    GenerationResponse, Generator,
};

#[cfg(test)]
pub use types::MockGenerator;
