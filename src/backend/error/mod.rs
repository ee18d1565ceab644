//! Backend Error Module
//!
//! Error types raised by backend clients.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Decoding of error responses
//! ```

/// Error type definitions
pub mod types;

/// Error response decoding
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
pub use conversion::error_from_response;
