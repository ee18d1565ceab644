/**
 * Backend Error Types
 *
 * This module defines the errors raised while talking to the hosted
 * backend: REST calls against tables, object storage requests and the
 * realtime websocket.
 *
 * # Error Categories
 *
 * ## HTTP Errors
 *
 * The backend answered with a non-success status. The response body is kept
 * as the message because PostgREST and the storage API put their
 * diagnostics there.
 *
 * ## Transport Errors
 *
 * The request never produced a response (DNS, TLS, connection reset) or
 * the websocket failed.
 *
 * ## Realtime Errors
 *
 * The realtime service rejected a join or sent a frame that does not follow
 * the channel protocol.
 */

use thiserror::Error;
use crate::shared::{ConfigError, SharedError};

/// Errors raised by a [`BackendClient`](crate::backend::BackendClient)
///
/// # Usage
///
/// ```rust
/// use share_everything::backend::error::BackendError;
///
/// let err = BackendError::http(404, "relation \"public.messages\" does not exist");
/// assert_eq!(err.status(), Some(404));
///
/// let err = BackendError::realtime("join rejected");
/// assert!(err.status().is_none());
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Non-success HTTP status from the REST or storage API
    #[error("HTTP {status}: {message}")]
    HttpError {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// HTTP transport failure
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    /// Websocket failure on the realtime connection
    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    /// Realtime protocol error (rejected join, unexpected frame)
    #[error("Realtime error: {message}")]
    RealtimeError {
        /// Human-readable error message
        message: String,
    },

    /// A channel or listener was used after it was closed
    #[error("Channel closed: {topic}")]
    ChannelClosed {
        /// Topic of the closed channel
        topic: String,
    },

    /// Failure injected or reported by a non-network backend
    #[error("Backend unavailable: {message}")]
    Unavailable {
        /// Human-readable error message
        message: String,
    },

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Invalid client configuration
    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::HttpError {
            status,
            message: message.into(),
        }
    }

    /// Create a new realtime protocol error
    pub fn realtime(message: impl Into<String>) -> Self {
        Self::RealtimeError {
            message: message.into(),
        }
    }

    /// Create a new channel-closed error
    pub fn channel_closed(topic: impl Into<String>) -> Self {
        Self::ChannelClosed {
            topic: topic.into(),
        }
    }

    /// Create a new unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// HTTP status of the failed call, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            Self::TransportError(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the failure happened before the backend could answer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::TransportError(_) | Self::WebSocketError(_) | Self::Unavailable { .. }
        )
    }
}
