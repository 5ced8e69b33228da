//! Error types for Recall
//!
//! All errors implement the `UnifiedError` trait which provides consistent fields:
//! - error_code: A unique identifier for programmatic error handling
//! - message: Human-readable error message
//! - context: Optional additional context about where/why the error occurred
//!
//! The request layer that sits in front of this crate maps errors through
//! [`ErrorCategory`]: invalid keys are client errors, generation failures are
//! retryable, concurrency violations are internal defects.

mod category;
mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use category::ErrorCategory;
pub use types::{RecallError, RecallResult, UnifiedError};
