//! Shared Error Types
//!
//! Errors raised while decoding or validating the data that flows between
//! the access layer and the hosted backend: message payloads, table rows
//! and realtime change records.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - A field is missing, mistyped or breaks an invariant
//! - `PayloadError` - A realtime or row payload has the wrong overall shape
//!
//! # Usage
//!
//! ```rust
//! use share_everything::shared::error::SharedError;
//!
//! let error = SharedError::validation("receiver", "receiver must not be empty");
//! ```
use thiserror::Error;

/// Errors shared by every layer of the crate
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// A single field failed validation
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// The payload as a whole is malformed (e.g. not a JSON object)
    #[error("Payload error: {message}")]
    PayloadError {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new payload error
    pub fn payload(message: impl Into<String>) -> Self {
        Self::PayloadError {
            message: message.into(),
        }
    }

    /// Name of the offending field, if the error is about one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
