//! Shared primitives for all Rust crates in the PokeBot receiver.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across PokeBot crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Write operation conflicts with an already stored record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller did not present valid admin credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal unexpected error, usually filesystem related.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_keeps_surrounding_whitespace() {
        let value = NonEmptyString::new(" admin ").unwrap_or_else(|_| panic!("test"));
        assert_eq!(value.as_str(), " admin ");
    }

    #[test]
    fn errors_render_their_category() {
        let error = AppError::Conflict("record 'abc' already exists".to_owned());
        assert_eq!(error.to_string(), "conflict: record 'abc' already exists");
    }
}
