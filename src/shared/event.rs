/**
 * Realtime Change Events
 *
 * This module defines the event the realtime feed emits for every row
 * inserted into a watched table. The record is kept as raw JSON until a
 * consumer decodes it with the strict schema of the row type it expects.
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::error::SharedError;
use crate::shared::message::Message;

/// A single INSERT observed on a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsertEvent {
    /// Schema of the table, e.g. `public`
    pub schema: String,
    /// Table name, e.g. `messages`
    pub table: String,
    /// Commit time reported by the backend, if any
    #[serde(default)]
    pub commit_timestamp: Option<String>,
    /// The inserted row
    pub record: Value,
}

impl InsertEvent {
    /// Create a new insert event
    pub fn new(schema: impl Into<String>, table: impl Into<String>, record: Value) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            commit_timestamp: None,
            record,
        }
    }

    /// Set the commit timestamp
    pub fn with_commit_timestamp(mut self, commit_timestamp: impl Into<String>) -> Self {
        self.commit_timestamp = Some(commit_timestamp.into());
        self
    }

    /// Whether the event concerns `schema.table`
    pub fn is_for(&self, schema: &str, table: &str) -> bool {
        self.schema == schema && self.table == table
    }

    /// Decode the record as a message row
    ///
    /// Malformed records are an error; the caller decides whether to skip
    /// the event, but it is never silently repaired.
    pub fn decode_message(&self) -> Result<Message, SharedError> {
        Message::from_payload(&self.record)
    }
}
