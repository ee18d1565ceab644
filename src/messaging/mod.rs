//! Messaging Module
//!
//! The message access layer used by UI code. Everything goes through
//! [`MessageRepository`], which wraps any [`BackendClient`](crate::backend::BackendClient).
//!
//! # Module Structure
//!
//! ```text
//! messaging/
//! ├── mod.rs           - Module exports
//! ├── repository.rs    - Insert and query operations
//! ├── subscription.rs  - Live conversation subscriptions
//! ├── attachments.rs   - File upload and attachment messages
//! └── error.rs         - MessagingError
//! ```

/// Messaging error types
pub mod error;

/// Message access object
pub mod repository;

/// Live conversation subscriptions
pub mod subscription;

/// Attachment uploads
pub mod attachments;

pub use error::MessagingError;
pub use repository::MessageRepository;
pub use subscription::ConversationSubscription;
