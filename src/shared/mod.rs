//! Shared Module
//!
//! Types shared by the backend client and the messaging access layer: the
//! message row, realtime change events, attachment helpers, configuration
//! and the common error type.
//!
//! # Overview
//!
//! Nothing in here performs I/O apart from reading configuration files and
//! environment variables. Everything is designed to serialize to and from
//! the JSON the hosted backend speaks.

/// Message row and strict payload decoding
pub mod message;

/// Realtime change events
pub mod event;

/// Shared error types
pub mod error;

/// Attachment naming and classification
pub mod attachment;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use message::{Message, MessageType};
pub use event::InsertEvent;
pub use error::SharedError;
pub use attachment::{AttachmentKind, DEFAULT_ATTACHMENTS_BUCKET};
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
