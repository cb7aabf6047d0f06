//! Shared primitives for all Rust crates in Gatewarden.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Gatewarden crates.
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

/// Field-keyed validation messages collected during a write check.
///
/// Keys are input field names; the reserved `entry` key carries failures
/// that concern the record as a whole rather than a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Creates an empty error map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for a field, keeping the first message per field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Returns whether any message was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the recorded messages keyed by field name.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Converts the accumulated messages into a result.
    ///
    /// An empty map yields `Ok(())`; anything else becomes
    /// [`AppError::FieldValidation`].
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::FieldValidation(self))
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        write!(formatter, "{rendered}")
    }
}

impl From<(&str, &str)> for FieldErrors {
    fn from((field, message): (&str, &str)) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant, single message.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid input with messages keyed by field name.
    #[error("validation error: {0}")]
    FieldValidation(FieldErrors),

    /// A required configuration value is missing or rejected before any I/O.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The external data source could not be reached or queried.
    #[error("external source error: {0}")]
    ExternalSource(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a [`AppError::FieldValidation`] with a single field message.
    #[must_use]
    pub fn field(field: &str, message: &str) -> Self {
        Self::FieldValidation(FieldErrors::from((field, message)))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, FieldErrors, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn field_errors_keep_first_message_per_field() {
        let mut errors = FieldErrors::new();
        errors.push("valid_until", "end date precedes start date");
        errors.push("valid_until", "second message is ignored");

        assert_eq!(
            errors.as_map().get("valid_until").map(String::as_str),
            Some("end date precedes start date")
        );
    }

    #[test]
    fn empty_field_errors_convert_to_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn populated_field_errors_convert_to_error() {
        let result = AppError::field("start_time", "both bounds are required");
        assert!(matches!(result, AppError::FieldValidation(_)));
        assert!(
            result
                .to_string()
                .contains("start_time: both bounds are required")
        );
    }
}
