//! Core error types and traits for Recall

use thiserror::Error;

/// Result type alias for Recall operations
pub type RecallResult<T> = Result<T, RecallError>;

/// Unified error trait that all Recall errors implement.
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Main error type for Recall
///
/// The type is `Clone` because a single generation outcome is handed to every
/// caller that joined the same in-flight generation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecallError {
    /// The external generator failed (timeout, provider error, invalid response)
    #[error("Generation failed for '{key}': {message}")]
    Generation {
        key: String,
        message: String,
        retryable: bool,
        context: Option<String>,
    },

    /// Malformed or empty subject key / conversation id
    #[error("Invalid {field}: {message}")]
    InvalidKey {
        field: String,
        message: String,
    },

    /// Two generations were observed running for the same key
    #[error("Concurrency violation: more than one generation in flight for '{key}'")]
    ConcurrencyViolation { key: String },

    /// Invalid input other than keys (prompts, review sets)
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Summary store errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        context: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// HTTP request errors
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        url: Option<String>,
        status_code: Option<u16>,
    },

    /// The provider did not answer within the request timeout
    #[error("Operation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
