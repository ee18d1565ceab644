//! Backend Module
//!
//! Access to the hosted backend-as-a-service platform: a Postgres database
//! exposed over REST, a realtime change feed and object storage.
//!
//! # Architecture
//!
//! - **`client`** - The `BackendClient` trait every implementation provides
//! - **`query`** - Filter/order model for selects
//! - **`supabase`** - HTTP + websocket client for the hosted service
//! - **`realtime`** - Realtime channel handles, protocol and socket task
//! - **`memory`** - In-memory fake used by tests and offline runs
//! - **`error`** - Backend error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs       - Module exports and documentation
//! ├── client.rs    - BackendClient trait
//! ├── query.rs     - Filters, ordering, PostgREST encoding
//! ├── supabase.rs  - Hosted service client
//! ├── memory.rs    - In-memory backend
//! ├── realtime/    - Change feed
//! └── error/       - Error types
//! ```
//!
//! # Thread Safety
//!
//! Clients are `Send + Sync` and are shared behind `Arc<dyn BackendClient>`.
//! Each call opens its own request; no state is shared between calls apart
//! from the connection pool inside `reqwest::Client`.

/// Backend client trait
pub mod client;

/// Row queries
pub mod query;

/// Hosted service client
pub mod supabase;

/// Real-time change feed
pub mod realtime;

/// In-memory backend
pub mod memory;

/// Backend error types
pub mod error;

/// Re-export commonly used types
pub use client::BackendClient;
pub use query::{Filter, Order, Query};
pub use supabase::SupabaseClient;
pub use realtime::{ChangeFeed, RealtimeChannel};
pub use memory::MemoryBackend;
pub use error::BackendError;
