//! Real-time Change Feed Module
//!
//! Client side of the realtime service: channel handles, the wire protocol
//! and the websocket task that turns row changes into `InsertEvent`s.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs      - Module exports and documentation
//! ├── channel.rs  - Channel handles and the change feed
//! ├── protocol.rs - Frame types and parsing
//! └── socket.rs   - Websocket connection task
//! ```
//!
//! # Delivery
//!
//! Events are pushed into an unbounded queue in the order the server sends
//! them. Nothing is reordered or deduplicated, and the feed lives until the
//! channel is closed or the server drops the connection.

/// Channel handles and change feeds
pub mod channel;

/// Realtime wire protocol
pub mod protocol;

/// Websocket connection task
pub mod socket;

// Re-export commonly used types and functions
pub use channel::{ChangeFeed, RealtimeChannel, StopSignal};
pub use protocol::{parse_frame, PhoenixMessage, RealtimeFrame};
