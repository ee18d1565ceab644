/**
 * Realtime Channel Protocol
 *
 * Wire frames exchanged with the realtime service. Every frame is a JSON
 * object `{ topic, event, payload, ref }`:
 *
 * - `phx_join` on `realtime:<topic>` registers interest in row changes,
 *   answered by a `phx_reply` carrying `status: ok | error`
 * - `heartbeat` on the `phoenix` topic keeps the socket alive
 * - `postgres_changes` delivers a change with the row in `payload.data.record`
 * - `phx_leave` / `phx_close` tear the channel down
 */
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shared::InsertEvent;

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";
pub const HEARTBEAT_TOPIC: &str = "phoenix";

/// A single frame on the realtime socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixMessage {
    /// Join request for INSERT changes on `schema.table`
    pub fn join(topic: &str, schema: &str, table: &str, reference: u64) -> Self {
        Self {
            topic: channel_topic(topic),
            event: EVENT_JOIN.to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [
                        { "event": "INSERT", "schema": schema, "table": table }
                    ]
                }
            }),
            reference: Some(reference.to_string()),
        }
    }

    /// Leave request for a joined topic
    pub fn leave(topic: &str, reference: u64) -> Self {
        Self {
            topic: channel_topic(topic),
            event: EVENT_LEAVE.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// Socket keep-alive
    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: HEARTBEAT_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }
}

/// Full channel topic for a user-facing topic name
pub fn channel_topic(topic: &str) -> String {
    if topic.starts_with("realtime:") {
        topic.to_string()
    } else {
        format!("realtime:{}", topic)
    }
}

/// Interpretation of an incoming frame
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeFrame {
    /// Row inserted on a watched table
    Insert(InsertEvent),
    /// Reply to a request we sent
    Reply {
        reference: Option<String>,
        ok: bool,
        reason: Option<String>,
    },
    /// The server closed or errored the channel
    Closed { reason: Option<String> },
    /// Anything else (presence, system notices, non-INSERT changes)
    Ignored(String),
}

/// Parse a text frame
pub fn parse_frame(text: &str) -> Result<RealtimeFrame, serde_json::Error> {
    let message: PhoenixMessage = serde_json::from_str(text)?;
    Ok(classify(message))
}

fn classify(message: PhoenixMessage) -> RealtimeFrame {
    match message.event.as_str() {
        EVENT_POSTGRES_CHANGES => match insert_event(&message.payload) {
            Some(event) => RealtimeFrame::Insert(event),
            None => RealtimeFrame::Ignored(message.event),
        },
        EVENT_REPLY => {
            let ok = message.payload.get("status").and_then(Value::as_str) == Some("ok");
            let reason = message
                .payload
                .get("response")
                .and_then(|r| r.get("reason"))
                .and_then(Value::as_str)
                .map(str::to_string);
            RealtimeFrame::Reply {
                reference: message.reference,
                ok,
                reason,
            }
        }
        EVENT_CLOSE | EVENT_ERROR => RealtimeFrame::Closed {
            reason: message
                .payload
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        _ => RealtimeFrame::Ignored(message.event),
    }
}

fn insert_event(payload: &Value) -> Option<InsertEvent> {
    let data = payload.get("data")?;
    if data.get("type").and_then(Value::as_str) != Some("INSERT") {
        return None;
    }

    let schema = data.get("schema").and_then(Value::as_str)?;
    let table = data.get("table").and_then(Value::as_str)?;
    let record = data.get("record").cloned().unwrap_or(Value::Null);

    let mut event = InsertEvent::new(schema, table, record);
    if let Some(ts) = data.get("commit_timestamp").and_then(Value::as_str) {
        event = event.with_commit_timestamp(ts);
    }
    Some(event)
}
