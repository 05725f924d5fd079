//! Stored record identity.

use chrono::{DateTime, Utc};
use pokebot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a record key, matching common filesystem name limits
/// once the `.json` suffix is appended.
pub const RECORD_KEY_MAX_LENGTH: usize = 128;

/// File stem of a persisted record.
///
/// Keys are restricted to ASCII alphanumerics, `_` and `-` so a key taken
/// from a URL can never escape its storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey(String);

impl RecordKey {
    /// Creates a validated record key.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(AppError::Validation(
                "record key must not be empty".to_owned(),
            ));
        }

        if value.len() > RECORD_KEY_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "record key must not exceed {RECORD_KEY_MAX_LENGTH} characters"
            )));
        }

        if !value
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '_' | '-'))
        {
            return Err(AppError::Validation(format!(
                "record key '{value}' may only contain letters, digits, '_' and '-'"
            )));
        }

        Ok(Self(value))
    }

    /// Generates a unique, arrival-ordered key for a purchase received at `now`.
    ///
    /// Format: `purchase_<unix millis, zero padded to 13 digits>_<8 hex chars>`.
    #[must_use]
    pub fn for_purchase(now: DateTime<Utc>) -> Self {
        let millis = now.timestamp_millis().max(0);
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("purchase_{millis:013}_{}", &suffix[..8]))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the file name the record is stored under.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }

    /// Parses a key back out of a stored file name, ignoring anything that is
    /// not a `.json` record.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".json")?;
        Self::new(stem).ok()
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
