//! Backend client seam
//!
//! Everything the messaging layer needs from the hosted platform, expressed
//! as one trait so the access layer can run against the real service or
//! against the in-memory fake.

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::error::BackendError;
use crate::backend::query::Query;
use crate::backend::realtime::{ChangeFeed, RealtimeChannel};

/// Table, realtime and storage operations of the hosted backend
///
/// Every call is a single request; implementations do not retry.
#[async_trait]
pub trait BackendClient: Send + Sync {
    // ========== Tables ==========

    /// Insert rows into a table
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<(), BackendError>;

    /// Select rows from a table
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError>;

    // ========== Realtime ==========

    /// Subscribe to INSERTs on `schema.table` under `topic`
    async fn subscribe_inserts(
        &self,
        topic: &str,
        schema: &str,
        table: &str,
    ) -> Result<ChangeFeed, BackendError>;

    /// Close a subscription opened by `subscribe_inserts`
    async fn unsubscribe(&self, channel: &RealtimeChannel) -> Result<(), BackendError>;

    // ========== Storage ==========

    /// Store an object under `bucket/name`
    async fn upload(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> Result<(), BackendError>;

    /// Public URL of `bucket/name`; no request is made
    fn public_url(&self, bucket: &str, name: &str) -> String;
}
