//! Constructor methods for RecallError

use super::types::RecallError;

impl RecallError {
    /// Create a retryable generation failure for `key`
    pub fn generation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            key: key.into(),
            message: message.into(),
            retryable: true,
            context: None,
        }
    }

    /// Create a generation failure that retrying will not fix
    pub fn generation_permanent(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            key: key.into(),
            message: message.into(),
            retryable: false,
            context: None,
        }
    }

    /// Create an invalid key error for the named field
    pub fn invalid_key(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a concurrency violation for `key`
    pub fn concurrency_violation(key: impl Into<String>) -> Self {
        Self::ConcurrencyViolation { key: key.into() }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            context: None,
        }
    }

    /// Create a storage error with context
    pub fn storage_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    /// Create an IO error with path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    /// Create a new HTTP error
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
            url: None,
            status_code: None,
        }
    }

    /// Create an HTTP error carrying the response status
    pub fn http_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Http {
            message: message.into(),
            url: None,
            status_code: Some(status_code),
        }
    }

    /// Create a new timeout error
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to an error that supports it
    pub fn with_context(mut self, new_context: impl Into<String>) -> Self {
        let new_context = Some(new_context.into());
        match &mut self {
            Self::Generation { context, .. }
            | Self::Config { context, .. }
            | Self::Storage { context, .. }
            | Self::Other { context, .. } => *context = new_context,
            _ => {}
        }
        self
    }

    /// Re-label any error coming out of a generator as a generation failure
    ///
    /// Errors that already are generation failures keep their retryability;
    /// HTTP and timeout errors stay retryable; anything else becomes permanent.
    pub fn into_generation(self, key: &str) -> Self {
        use super::types::UnifiedError;
        match self {
            Self::Generation { .. } => self,
            other => {
                let retryable = other.is_retryable();
                Self::Generation {
                    key: key.to_string(),
                    message: other.to_string(),
                    retryable,
                    context: None,
                }
            }
        }
    }
}
