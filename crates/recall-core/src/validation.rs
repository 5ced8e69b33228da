//! Key validation shared by the summary cache and the conversation registry

use crate::error::{RecallError, RecallResult};

/// Longest key accepted, in bytes
pub const MAX_KEY_LEN: usize = 256;

/// Validate a subject key or conversation id.
///
/// `field` names the argument in the error (`"key"`, `"conversation_id"`).
pub fn validate_key(field: &str, key: &str) -> RecallResult<()> {
    if key.trim().is_empty() {
        return Err(RecallError::invalid_key(field, "must not be empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(RecallError::invalid_key(
            field,
            format!("must be at most {} bytes, got {}", MAX_KEY_LEN, key.len()),
        ));
    }
    if key.chars().any(char::is_control) {
        return Err(RecallError::invalid_key(
            field,
            "must not contain control characters",
        ));
    }
    Ok(())
}
