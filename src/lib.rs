//! Share Everything - Messaging Access Library
//!
//! Data access layer for a one-to-one chat application whose storage,
//! realtime feed and file hosting live on a hosted Postgres platform
//! (Supabase). UI code talks to [`MessageRepository`] and never sees HTTP,
//! websockets or SQL.
//!
//! # Overview
//!
//! - Insert chat messages and read conversations between two users
//! - List every conversation a user takes part in
//! - Subscribe to new messages in a conversation as they are inserted
//! - Upload attachments and share them as `file` messages
//! - Check whether a user is registered
//!
//! # Module Structure
//!
//! - **`shared`** - Plain data types with no I/O
//!   - `Message`, `InsertEvent`, attachment naming
//!   - `AppConfig` and its builder
//!   - Error types for decoding and validation
//!
//! - **`backend`** - Everything that talks to the platform
//!   - `BackendClient` trait
//!   - `SupabaseClient` (REST, storage, realtime websocket)
//!   - `MemoryBackend` for tests and offline runs
//!   - Query model with PostgREST encoding
//!
//! - **`messaging`** - The access object UI code uses
//!   - `MessageRepository` operations
//!   - Conversation subscriptions and attachments
//!
//! - **`logging`** - Tracing subscriber setup
//!
//! # Usage
//!
//! ```rust,no_run
//! use share_everything::{AppConfig, MessageRepository, Message};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let repo = MessageRepository::connect(config)?;
//!
//! repo.send(&Message::text("alice", "bob", "hello")).await?;
//! let history = repo.fetch_conversation("alice", "bob").await?;
//!
//! let subscription = repo
//!     .subscribe("alice", "bob", |message| println!("{}: {}", message.sender, message.content))
//!     .await?;
//! repo.unsubscribe(subscription).await;
//! # let _ = history;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - `MessageRepository` is `Clone + Send + Sync`; clones share one client
//! - Subscription callbacks run on a background tokio task
//! - No shared mutable state outside the clients themselves
//!
//! # Error Handling
//!
//! - `SharedError` for decoding and validation
//! - `BackendError` for transport, HTTP and realtime failures
//! - `MessagingError` wraps both at the access layer; read operations
//!   return it rather than an empty list

/// Shared types and data structures
pub mod shared;

/// Hosted platform access
pub mod backend;

/// Message access layer
pub mod messaging;

/// Tracing setup
pub mod logging;

pub use backend::{BackendClient, BackendError, MemoryBackend, SupabaseClient};
pub use messaging::{ConversationSubscription, MessageRepository, MessagingError};
pub use shared::{AppConfig, InsertEvent, Message, MessageType};
