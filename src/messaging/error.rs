//! Messaging Error Types
//!
//! Errors returned by the message access layer. Read paths return these
//! instead of an empty list, so "no messages yet" and "the query failed" are
//! never confused.

use thiserror::Error;

use crate::backend::BackendError;
use crate::shared::SharedError;

/// Errors raised by [`MessageRepository`](crate::messaging::MessageRepository)
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The message or payload was rejected before reaching the backend
    #[error("Invalid message: {0}")]
    InvalidMessage(#[source] SharedError),

    /// The backend returned a row that does not match the message schema
    #[error("Malformed row from backend: {0}")]
    MalformedRow(#[source] SharedError),

    /// The backend call itself failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl MessagingError {
    /// Whether the failure came from the backend rather than the input
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::MalformedRow(_))
    }
}
