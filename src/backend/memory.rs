//! In-memory backend
//!
//! A fake of the hosted platform for tests and offline use. Tables are
//! vectors of JSON rows, storage is a map of byte buffers, and every insert
//! is pushed to the live subscriptions on its table.
//!
//! Behaviour mirrors the hosted service where the access layer can observe
//! it: ids are assigned sequentially on insert, `created_at` is filled in
//! when the row does not carry one, and selects honour filter, order and
//! limit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::backend::client::BackendClient;
use crate::backend::error::BackendError;
use crate::backend::query::Query;
use crate::backend::realtime::{ChangeFeed, RealtimeChannel};
use crate::shared::{InsertEvent, SharedError};

const DEFAULT_BASE_URL: &str = "http://localhost:54321";
const DEFAULT_SCHEMA: &str = "public";

/// Operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Select,
    Subscribe,
    Unsubscribe,
    Upload,
}

struct Subscription {
    id: Uuid,
    table: String,
    sender: mpsc::UnboundedSender<InsertEvent>,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
    subscriptions: Vec<Subscription>,
    objects: HashMap<(String, String), Vec<u8>>,
    failures: HashSet<Operation>,
}

/// In-memory implementation of [`BackendClient`]
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
    schema: String,
    base_url: String,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Backend whose public URLs start with `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            schema: DEFAULT_SCHEMA.to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Make the next call of `operation` fail
    pub async fn fail_next(&self, operation: Operation) {
        self.state.write().await.failures.insert(operation);
    }

    /// All rows of a table in insertion order
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.state.read().await.tables.get(table).cloned().unwrap_or_default()
    }

    /// Stored bytes of `bucket/name`
    pub async fn object(&self, bucket: &str, name: &str) -> Option<Vec<u8>> {
        self.state
            .read()
            .await
            .objects
            .get(&(bucket.to_string(), name.to_string()))
            .cloned()
    }

    /// Sorted names of every object stored in `bucket`
    pub async fn object_names(&self, bucket: &str) -> Vec<String> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of open subscriptions
    pub async fn subscription_count(&self) -> usize {
        self.state.read().await.subscriptions.len()
    }

    fn take_failure(state: &mut State, operation: Operation) -> Result<(), BackendError> {
        if state.failures.remove(&operation) {
            return Err(BackendError::unavailable(format!("injected {:?} failure", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl BackendClient for MemoryBackend {
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        Self::take_failure(&mut state, Operation::Insert)?;

        if rows.iter().any(|row| !row.is_object()) {
            return Err(SharedError::payload("every inserted row must be a JSON object").into());
        }

        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            state.next_id += 1;
            let id = state.next_id;
            if let Some(object) = row.as_object_mut() {
                object.insert("id".to_string(), Value::from(id));
                if object.get("created_at").map_or(true, Value::is_null) {
                    let now = chrono::Utc::now().to_rfc3339();
                    object.insert("created_at".to_string(), Value::from(now));
                }
            }
            inserted.push(row);
        }

        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(inserted.iter().cloned());

        let schema = self.schema.clone();
        state.subscriptions.retain(|sub| {
            if sub.table != table {
                return !sub.sender.is_closed();
            }
            inserted.iter().all(|row| {
                sub.sender
                    .send(InsertEvent::new(schema.clone(), table, row.clone()))
                    .is_ok()
            })
        });

        tracing::debug!("[Memory] Inserted {} row(s) into {}", inserted.len(), table);
        Ok(())
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError> {
        let mut state = self.state.write().await;
        Self::take_failure(&mut state, Operation::Select)?;

        let rows = state.tables.get(table).map(|rows| query.apply(rows)).unwrap_or_default();
        Ok(rows)
    }

    async fn subscribe_inserts(
        &self,
        topic: &str,
        schema: &str,
        table: &str,
    ) -> Result<ChangeFeed, BackendError> {
        let mut state = self.state.write().await;
        Self::take_failure(&mut state, Operation::Subscribe)?;

        if schema != self.schema {
            return Err(BackendError::realtime(format!("unknown schema {}", schema)));
        }

        let (channel, mut stop) = RealtimeChannel::open(topic);
        let (sender, events) = mpsc::unbounded_channel();
        let id = channel.id();
        state.subscriptions.push(Subscription {
            id,
            table: table.to_string(),
            sender,
        });

        // Ends once the channel is closed or its last handle dropped.
        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            stop.stopped().await;
            shared.write().await.subscriptions.retain(|sub| sub.id != id);
        });

        tracing::debug!("[Memory] Subscribed {} to {}.{}", channel.id(), schema, table);
        Ok(ChangeFeed { channel, events })
    }

    async fn unsubscribe(&self, channel: &RealtimeChannel) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        Self::take_failure(&mut state, Operation::Unsubscribe)?;

        let before = state.subscriptions.len();
        let id = channel.id();
        state.subscriptions.retain(|sub| sub.id != id);
        channel.close();

        if state.subscriptions.len() == before {
            return Err(BackendError::channel_closed(channel.topic()));
        }
        Ok(())
    }

    async fn upload(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        Self::take_failure(&mut state, Operation::Upload)?;

        let key = (bucket.to_string(), name.to_string());
        if state.objects.contains_key(&key) {
            return Err(BackendError::http(409, "The resource already exists"));
        }
        state.objects.insert(key, bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, name)
    }
}
