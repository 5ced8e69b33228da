//! Error classification for the request layer

use super::types::{RecallError, UnifiedError};

/// How a request layer should surface an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller sent something malformed (HTTP 400)
    Client,
    /// A transient failure; the caller may retry (HTTP 503)
    Retryable,
    /// Generation failed in a way retrying will not fix (HTTP 502)
    Upstream,
    /// Bad configuration or storage state (HTTP 500)
    Internal,
}

impl ErrorCategory {
    /// Classify an error
    pub fn of(error: &RecallError) -> Self {
        match error {
            RecallError::InvalidKey { .. } | RecallError::InvalidInput { .. } => Self::Client,
            RecallError::ConcurrencyViolation { .. } => Self::Internal,
            RecallError::Generation { .. } if error.is_retryable() => Self::Retryable,
            RecallError::Generation { .. } => Self::Upstream,
            _ if error.is_retryable() => Self::Retryable,
            _ => Self::Internal,
        }
    }

    /// Suggested HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Client => 400,
            Self::Retryable => 503,
            Self::Upstream => 502,
            Self::Internal => 500,
        }
    }
}

impl RecallError {
    /// Shorthand for [`ErrorCategory::of`]
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::of(self)
    }
}
