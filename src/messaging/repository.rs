//! Message access object
//!
//! [`MessageRepository`] is the only entry point UI code needs: it inserts
//! messages, reads conversations, opens realtime subscriptions and handles
//! attachments. Every method is a single backend request (or a single
//! long-lived subscription); nothing is retried.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::backend::{BackendClient, BackendError, Filter, Query, SupabaseClient};
use crate::messaging::error::MessagingError;
use crate::shared::{AppConfig, Message};

const COLUMN_SENDER: &str = "sender";
const COLUMN_RECEIVER: &str = "receiver";
const COLUMN_TIMESTAMP: &str = "timestamp";
const COLUMN_PHONE_NUMBER: &str = "phone_number";

/// Message access object over a [`BackendClient`]
#[derive(Clone)]
pub struct MessageRepository {
    pub(crate) backend: Arc<dyn BackendClient>,
    pub(crate) config: AppConfig,
}

impl MessageRepository {
    pub fn new(backend: Arc<dyn BackendClient>, config: AppConfig) -> Self {
        Self { backend, config }
    }

    /// Repository backed by a new hosted-service client
    pub fn connect(config: AppConfig) -> Result<Self, BackendError> {
        let client = SupabaseClient::new(config.clone())?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Repository backed by the process-wide client built from the environment
    pub async fn from_env() -> Result<Self, BackendError> {
        let client = SupabaseClient::shared().await?;
        let config = client.config().clone();
        Ok(Self::new(client, config))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Insert a message given as a loosely-typed JSON payload
    ///
    /// The payload must carry sender, receiver, content, type and timestamp;
    /// `created_at` is optional. Any `id` in the payload is ignored.
    pub async fn insert_message(&self, payload: &Value) -> Result<Message, MessagingError> {
        let message = Message::from_payload(payload).map_err(|e| {
            tracing::error!("[Messages] Rejected message payload: {}", e);
            MessagingError::InvalidMessage(e)
        })?;
        self.send(&message).await
    }

    /// Insert an already typed message
    ///
    /// Returns the message as written (without the backend-assigned id).
    pub async fn send(&self, message: &Message) -> Result<Message, MessagingError> {
        if let Err(e) = message.validate() {
            tracing::error!(
                "[Messages] Rejected message from {} to {}: {}",
                message.sender,
                message.receiver,
                e
            );
            return Err(MessagingError::InvalidMessage(e));
        }

        let row = message.to_insert_row().map_err(MessagingError::InvalidMessage)?;
        match self.backend.insert(&self.config.messages_table, vec![row]).await {
            Ok(()) => {
                tracing::info!(
                    "[Messages] Message inserted from {} to {}",
                    message.sender,
                    message.receiver
                );
                let mut sent = message.clone();
                sent.id = None;
                Ok(sent)
            }
            Err(e) => {
                tracing::error!(
                    "[Messages] Error inserting message from {} to {}: {}",
                    message.sender,
                    message.receiver,
                    e
                );
                Err(e.into())
            }
        }
    }

    /// All messages exchanged between `a` and `b`, oldest first
    pub async fn fetch_conversation(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Vec<Message>, MessagingError> {
        let query = Query::new()
            .filter(Filter::or(vec![
                Filter::and(vec![Filter::eq(COLUMN_SENDER, a), Filter::eq(COLUMN_RECEIVER, b)]),
                Filter::and(vec![Filter::eq(COLUMN_SENDER, b), Filter::eq(COLUMN_RECEIVER, a)]),
            ]))
            .order_by(COLUMN_TIMESTAMP, true);

        let messages = self.select_messages(&query).await.map_err(|e| {
            tracing::error!(
                "[Messages] Error fetching conversation between {} and {}: {}",
                a,
                b,
                e
            );
            e
        })?;
        tracing::debug!("[Messages] Fetched {} message(s) between {} and {}", messages.len(), a, b);
        Ok(messages)
    }

    /// Every message `user` sent or received, newest first
    pub async fn fetch_all_conversations(
        &self,
        user: &str,
    ) -> Result<Vec<Message>, MessagingError> {
        let query = Query::new()
            .filter(Filter::or(vec![
                Filter::eq(COLUMN_SENDER, user),
                Filter::eq(COLUMN_RECEIVER, user),
            ]))
            .order_by(COLUMN_TIMESTAMP, false);

        self.select_messages(&query).await.map_err(|e| {
            tracing::error!("[Messages] Error fetching conversations for {}: {}", user, e);
            e
        })
    }

    /// Users `user` has exchanged messages with, most recent first
    pub async fn conversation_partners(&self, user: &str) -> Result<Vec<String>, MessagingError> {
        let messages = self.fetch_all_conversations(user).await?;

        let mut seen = HashSet::new();
        let partners = messages
            .iter()
            .filter_map(|m| m.other_party(user))
            .filter(|other| seen.insert(other.to_string()))
            .map(str::to_string)
            .collect();
        Ok(partners)
    }

    /// Whether a user with this phone number is registered
    pub async fn user_exists(&self, phone_number: &str) -> Result<bool, MessagingError> {
        let query = Query::new()
            .filter(Filter::eq(COLUMN_PHONE_NUMBER, phone_number))
            .limit(1);

        match self.backend.select(&self.config.users_table, &query).await {
            Ok(rows) => Ok(!rows.is_empty()),
            Err(e) => {
                tracing::error!("[Users] Error checking if user exists: {}", e);
                Err(e.into())
            }
        }
    }

    async fn select_messages(&self, query: &Query) -> Result<Vec<Message>, MessagingError> {
        let rows = self.backend.select(&self.config.messages_table, query).await?;
        rows.iter()
            .map(|row| Message::from_payload(row).map_err(MessagingError::MalformedRow))
            .collect()
    }
}
