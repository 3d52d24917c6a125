//! Business workflows behind the HTTP handlers.
//!
//! Services take the store and already-authenticated callers, enforce the
//! cross-entity rules and return domain values or an [`ApiError`].
//!
//! [`ApiError`]: crate::error::ApiError

pub mod admin;
pub mod auth;
pub mod patients;

use validator::ValidationErrors;

use crate::error::ApiError;

/// Listing endpoints never return more than this many rows.
pub const LIST_LIMIT: i64 = 100;

/// A supplied, non-blank string.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// "Invalid value for: age, fasting_bs", fields sorted for stable output.
pub(crate) fn invalid_fields(errors: ValidationErrors) -> ApiError {
    let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
    fields.sort_unstable();
    ApiError::validation(format!("Invalid value for: {}", fields.join(", ")))
}
