//! UnifiedError trait implementation for RecallError

use super::types::{RecallError, UnifiedError};

impl UnifiedError for RecallError {
    fn error_code(&self) -> &str {
        match self {
            Self::Generation { .. } => "RECALL_GENERATION",
            Self::InvalidKey { .. } => "RECALL_INVALID_KEY",
            Self::ConcurrencyViolation { .. } => "RECALL_CONCURRENCY_VIOLATION",
            Self::InvalidInput { .. } => "RECALL_INVALID_INPUT",
            Self::Config { .. } => "RECALL_CONFIG",
            Self::Storage { .. } => "RECALL_STORAGE",
            Self::Io { .. } => "RECALL_IO",
            Self::Json { .. } => "RECALL_JSON",
            Self::Http { .. } => "RECALL_HTTP",
            Self::Timeout { .. } => "RECALL_TIMEOUT",
            Self::Other { .. } => "RECALL_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Generation { message, .. } => message,
            Self::InvalidKey { message, .. } => message,
            Self::ConcurrencyViolation { .. } => "More than one generation in flight for a key",
            Self::InvalidInput { message, .. } => message,
            Self::Config { message, .. } => message,
            Self::Storage { message, .. } => message,
            Self::Io { message, .. } => message,
            Self::Json { message } => message,
            Self::Http { message, .. } => message,
            Self::Timeout { .. } => "Operation timed out",
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Generation { context, .. } => context.as_deref(),
            Self::Config { context, .. } => context.as_deref(),
            Self::Storage { context, .. } => context.as_deref(),
            Self::Other { context, .. } => context.as_deref(),
            Self::InvalidKey { field, .. } => Some(field),
            Self::Io { path, .. } => path.as_deref(),
            Self::Http { url, .. } => url.as_deref(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Generation { retryable, .. } => *retryable,
            Self::Http { status_code, .. } => match status_code {
                Some(code) => *code == 408 || *code == 429 || *code >= 500,
                None => true,
            },
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct_for_core_taxonomy() {
        let generation = RecallError::generation("product-1", "provider down");
        let invalid = RecallError::invalid_key("key", "must not be empty");
        let violation = RecallError::concurrency_violation("product-1");

        assert_eq!(generation.error_code(), "RECALL_GENERATION");
        assert_eq!(invalid.error_code(), "RECALL_INVALID_KEY");
        assert_eq!(violation.error_code(), "RECALL_CONCURRENCY_VIOLATION");
    }

    #[test]
    fn test_retryability() {
        assert!(RecallError::generation("k", "503").is_retryable());
        assert!(!RecallError::generation_permanent("k", "bad request").is_retryable());
        assert!(RecallError::http_status("rate limited", 429).is_retryable());
        assert!(!RecallError::http_status("unauthorized", 401).is_retryable());
        assert!(RecallError::timeout(30).is_retryable());
        assert!(!RecallError::invalid_key("key", "empty").is_retryable());
    }

    #[test]
    fn test_into_generation_keeps_retryability() {
        let err = RecallError::http_status("bad gateway", 502).into_generation("product-3");
        match err {
            RecallError::Generation { key, retryable, .. } => {
                assert_eq!(key, "product-3");
                assert!(retryable);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = RecallError::invalid_input("empty prompt").into_generation("product-3");
        assert!(!err.is_retryable());

        let original = RecallError::generation_permanent("product-3", "refused");
        assert_eq!(original.clone().into_generation("other"), original);
    }

    #[test]
    fn test_context_attaches() {
        let err = RecallError::storage("write failed").with_context("upserting 'product-9'");
        assert_eq!(err.context(), Some("upserting 'product-9'"));
    }
}
