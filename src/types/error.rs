//! Duration validation errors.

use thiserror::Error;

/// Errors produced when focus/break durations fail validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// Input was not an integer.
    #[error("{field} は整数で指定してください: '{value}'")]
    NotANumber {
        /// Field that failed validation
        field: &'static str,
        /// Rejected input
        value: String,
    },

    /// Input was zero or negative.
    #[error("{field} は1以上で指定してください: {value}")]
    NotPositive {
        /// Field that failed validation
        field: &'static str,
        /// Rejected input
        value: String,
    },

    /// Input does not fit the countdown range.
    #[error("{field} が大きすぎます: {value}")]
    TooLarge {
        /// Field that failed validation
        field: &'static str,
        /// Rejected input
        value: String,
    },
}

impl DurationError {
    /// Returns the name of the field that failed validation.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::NotANumber { field, .. }
            | Self::NotPositive { field, .. }
            | Self::TooLarge { field, .. } => field,
        }
    }
}
