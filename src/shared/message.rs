/**
 * Message Data Structure
 *
 * This module defines the Message struct stored in the backend `messages`
 * table and pushed over the realtime feed, together with the strict decoder
 * used for loosely-typed payloads and change records.
 *
 * The backend table is the source of truth. A `Message` held by the client
 * is a transient copy: `id` and `created_at` are only known once the row has
 * been persisted.
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::shared::error::SharedError;

/// Type tag of a message
///
/// The backend stores the tag as free text. Known tags get their own
/// variant; anything else is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Plain text message
    Text,
    /// Inline image
    Image,
    /// File attachment; the content is the attachment's public URL
    File,
    /// Unrecognised tag
    Other(String),
}

impl MessageType {
    /// Tag as stored in the `type` column
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::File => "file",
            MessageType::Other(tag) => tag.as_str(),
        }
    }

    /// Parse a tag from the `type` column
    pub fn parse(tag: &str) -> Self {
        match tag {
            "text" => MessageType::Text,
            "image" => MessageType::Image,
            "file" => MessageType::File,
            other => MessageType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message between two users
///
/// Field names follow the columns of the `messages` table, so the struct
/// serializes directly into an insert row and deserializes from a select.
///
/// # Fields
/// * `id` - Row identifier, assigned by the backend on insert
/// * `sender` / `receiver` - User identifiers of both parties
/// * `content` - Message text, or the public URL for file messages
/// * `message_type` - Type tag (`type` column), e.g. `text` or `file`
/// * `timestamp` - Sender-assigned milliseconds since the epoch
/// * `created_at` - Backend-assigned creation time
///
/// # Example
/// ```rust
/// use share_everything::shared::Message;
///
/// let message = Message::new("alice", "bob", "hi", "text", 1_700_000_000_000);
/// assert!(message.validate().is_ok());
/// assert!(message.id.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Message {
    /// Create an unsaved message with an explicit timestamp
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: impl Into<String>,
        message_type: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: None,
            sender: sender.into(),
            receiver: receiver.into(),
            content: content.into(),
            message_type: message_type.into(),
            timestamp,
            created_at: None,
        }
    }

    /// Create a text message stamped with the current time
    pub fn text(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(sender, receiver, content, MessageType::Text.as_str(), now_millis())
    }

    /// Create a file message pointing at an uploaded attachment
    pub fn file(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        public_url: impl Into<String>,
    ) -> Self {
        Self::new(sender, receiver, public_url, MessageType::File.as_str(), now_millis())
    }

    /// Set the client-side creation time (RFC3339)
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    /// Parsed type tag
    pub fn kind(&self) -> MessageType {
        MessageType::parse(&self.message_type)
    }

    /// Check the conversation invariant: both parties present and distinct
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.sender.trim().is_empty() {
            return Err(SharedError::validation("sender", "sender must not be empty"));
        }
        if self.receiver.trim().is_empty() {
            return Err(SharedError::validation("receiver", "receiver must not be empty"));
        }
        if self.sender == self.receiver {
            return Err(SharedError::validation(
                "receiver",
                "sender and receiver must be different users",
            ));
        }
        Ok(())
    }

    /// Whether this message belongs to the conversation between `a` and `b`
    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.sender == a && self.receiver == b) || (self.sender == b && self.receiver == a)
    }

    /// The counterpart of `user`, if `user` takes part in this message
    pub fn other_party(&self, user: &str) -> Option<&str> {
        if self.sender == user {
            Some(&self.receiver)
        } else if self.receiver == user {
            Some(&self.sender)
        } else {
            None
        }
    }

    /// Decode a loosely-typed payload or row into a message
    ///
    /// Every field must carry its declared JSON type. Strings are taken as
    /// they are; no trimming or unquoting happens here, so a timestamp that
    /// arrives as `"1700000000000"` is rejected instead of coerced.
    pub fn from_payload(payload: &Value) -> Result<Self, SharedError> {
        let object = payload
            .as_object()
            .ok_or_else(|| SharedError::payload("message payload must be a JSON object"))?;

        Ok(Self {
            id: optional_i64(object, "id")?,
            sender: required_str(object, "sender")?,
            receiver: required_str(object, "receiver")?,
            content: required_str(object, "content")?,
            message_type: required_str(object, "type")?,
            timestamp: required_i64(object, "timestamp")?,
            created_at: optional_str(object, "created_at")?,
        })
    }

    /// Row to send on insert; `id` is left for the backend to assign
    pub fn to_insert_row(&self) -> Result<Value, SharedError> {
        let mut row = serde_json::to_value(self)?;
        if let Some(object) = row.as_object_mut() {
            object.remove("id");
        }
        Ok(row)
    }
}

/// Current time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn required_str(object: &Map<String, Value>, field: &str) -> Result<String, SharedError> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(SharedError::validation(
            field,
            format!("expected a string, found {}", json_kind(other)),
        )),
        None => Err(SharedError::validation(field, "field is missing")),
    }
}

fn required_i64(object: &Map<String, Value>, field: &str) -> Result<i64, SharedError> {
    match object.get(field) {
        Some(value @ Value::Number(number)) => number.as_i64().ok_or_else(|| {
            SharedError::validation(field, format!("expected an integer, found {}", value))
        }),
        Some(other) => Err(SharedError::validation(
            field,
            format!("expected an integer, found {}", json_kind(other)),
        )),
        None => Err(SharedError::validation(field, "field is missing")),
    }
}

fn optional_str(object: &Map<String, Value>, field: &str) -> Result<Option<String>, SharedError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => required_str(object, field).map(Some),
    }
}

fn optional_i64(object: &Map<String, Value>, field: &str) -> Result<Option<i64>, SharedError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => required_i64(object, field).map(Some),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
