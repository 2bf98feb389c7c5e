use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Success";
pub const FAILURE_MESSAGE: &str = "Failure";
pub const NULL_VALUE_MESSAGE: &str = "Value cannot be null";
pub const VALIDATION_MESSAGE: &str = "One or more validation errors occurred.";

/// Uniform result envelope returned by every request handler.
///
/// Serialises as `{ isSuccess, message, data?, totalCount?, errors? }`.
/// A successful outcome never carries errors; a failed one never carries
/// data and always has a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome<T> {
    is_success: bool,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

impl<T> Outcome<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, SUCCESS_MESSAGE)
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            message: message.into(),
            data: Some(data),
            total_count: None,
            errors: None,
        }
    }

    /// Success carrying the number of rows that matched before paging.
    pub fn success_with_count(data: T, total_count: usize) -> Self {
        Self {
            total_count: Some(total_count),
            ..Self::success(data)
        }
    }

    /// Failure with a human-readable reason. An empty reason becomes
    /// `"Failure"`.
    pub fn failure(message: impl Display) -> Self {
        let message = message.to_string();
        Self {
            is_success: false,
            message: if message.is_empty() {
                FAILURE_MESSAGE.to_string()
            } else {
                message
            },
            data: None,
            total_count: None,
            errors: None,
        }
    }

    /// Success when a value is present.
    pub fn create(value: Option<T>) -> Self {
        Self::create_or(value, NULL_VALUE_MESSAGE)
    }

    pub fn create_or(value: Option<T>, message: impl Display) -> Self {
        match value {
            Some(data) => Self::success(data),
            None => Self::failure(message),
        }
    }

    /// Failure listing every rejected input, one message per entry.
    pub fn validation_failure(errors: Vec<String>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::failure(VALIDATION_MESSAGE)
        }
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn total_count(&self) -> Option<usize> {
        self.total_count
    }

    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Convert the payload, keeping the rest of the envelope.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            is_success: self.is_success,
            message: self.message,
            data: self.data.map(f),
            total_count: self.total_count,
            errors: self.errors,
        }
    }
}

impl Outcome<()> {
    /// Success without a payload
    pub fn ok() -> Self {
        Self::success(())
    }
}
