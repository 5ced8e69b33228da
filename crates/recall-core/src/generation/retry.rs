//! Retrying wrapper for generators
//!
//! Retries live in front of the provider, never inside the summary cache: the
//! cache only promises one generator call per concurrent miss-group, and a
//! retrying generator counts as one call.

use super::backoff::{BackoffConfig, ExponentialBackoff};
use super::types::{GenerationRequest, GenerationResponse, Generator};
use crate::error::{RecallResult, UnifiedError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy for generation calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Maximum delay between retries
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Create the backoff schedule for this policy
    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(BackoffConfig {
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            multiplier: self.backoff_multiplier,
            jitter: self.jitter,
            jitter_ratio: 0.2,
        })
    }
}

/// Wraps a generator and retries retryable failures with exponential backoff
#[derive(Debug)]
pub struct RetryingGenerator<G> {
    inner: G,
    config: RetryConfig,
    backoff: ExponentialBackoff,
}

impl<G: Generator> RetryingGenerator<G> {
    pub fn new(inner: G, config: RetryConfig) -> Self {
        let backoff = config.create_backoff();
        Self {
            inner,
            config,
            backoff,
        }
    }

    /// The wrapped generator
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: Generator> Generator for RetryingGenerator<G> {
    async fn generate(&self, request: GenerationRequest) -> RecallResult<GenerationResponse> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.inner.generate(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    attempt += 1;
                    if !error.is_retryable() || attempt >= max_attempts {
                        if attempt > 1 {
                            warn!("Generation failed after {} attempts: {}", attempt, error);
                        }
                        return Err(error);
                    }

                    let delay = self.backoff.delay_for_attempt(attempt - 1);
                    debug!(
                        "Generation attempt {}/{} failed ({}); retrying in {:?}",
                        attempt, max_attempts, error, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
