/**
 * Conversation Subscriptions
 *
 * Live delivery of new messages between two users. The repository opens an
 * INSERT feed on the messages table and a listener task filters it down to
 * one conversation before calling back into the caller.
 *
 * # Delivery
 *
 * - Callbacks run on the listener task, in the order the feed delivers rows
 * - Rows that do not decode as messages are logged and skipped
 * - Rows between other users are dropped silently
 * - After `unsubscribe` returns, no further callbacks are made
 */
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::RealtimeChannel;
use crate::messaging::error::MessagingError;
use crate::messaging::repository::MessageRepository;
use crate::shared::{InsertEvent, Message};

/// An open subscription to one conversation
///
/// Dropping it without calling [`MessageRepository::unsubscribe`] also ends
/// the subscription: the channel handle is the last one, and the backend
/// stops the feed once every handle is gone.
#[derive(Debug)]
pub struct ConversationSubscription {
    channel: RealtimeChannel,
    listener: JoinHandle<()>,
    participants: (String, String),
}

impl ConversationSubscription {
    /// The underlying realtime channel
    pub fn channel(&self) -> &RealtimeChannel {
        &self.channel
    }

    /// The two users whose messages are delivered
    pub fn participants(&self) -> (&str, &str) {
        (&self.participants.0, &self.participants.1)
    }

    /// Whether the listener is still running
    pub fn is_active(&self) -> bool {
        !self.channel.is_closed() && !self.listener.is_finished()
    }
}

impl MessageRepository {
    /// Deliver every new message between `a` and `b` to `on_message`
    pub async fn subscribe<F>(
        &self,
        a: &str,
        b: &str,
        on_message: F,
    ) -> Result<ConversationSubscription, MessagingError>
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        let feed = self
            .backend
            .subscribe_inserts(
                &self.config.realtime_topic,
                &self.config.schema,
                &self.config.messages_table,
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    "[Realtime] Failed to subscribe to conversation {} <-> {}: {}",
                    a,
                    b,
                    e
                );
                e
            })?;

        tracing::info!("[Realtime] Subscribed to conversation {} <-> {}", a, b);

        let filter = ConversationFilter {
            schema: self.config.schema.clone(),
            table: self.config.messages_table.clone(),
            a: a.to_string(),
            b: b.to_string(),
        };
        let listener = tokio::spawn(listen(feed.events, filter, on_message));

        Ok(ConversationSubscription {
            channel: feed.channel,
            listener,
            participants: (a.to_string(), b.to_string()),
        })
    }

    /// Tear down a subscription
    ///
    /// Best effort: a failure to close the backend channel is logged and
    /// otherwise ignored. The listener is stopped either way.
    pub async fn unsubscribe(&self, subscription: ConversationSubscription) {
        let ConversationSubscription { channel, listener, participants } = subscription;

        if let Err(e) = self.backend.unsubscribe(&channel).await {
            tracing::warn!(
                "[Realtime] Error unsubscribing from conversation {} <-> {}: {}",
                participants.0,
                participants.1,
                e
            );
        }
        channel.close();

        listener.abort();
        let _ = listener.await;
        tracing::info!(
            "[Realtime] Unsubscribed from conversation {} <-> {}",
            participants.0,
            participants.1
        );
    }
}

struct ConversationFilter {
    schema: String,
    table: String,
    a: String,
    b: String,
}

impl ConversationFilter {
    /// Decode an event and keep it only if it belongs to the conversation
    fn accept(&self, event: &InsertEvent) -> Option<Message> {
        if !event.is_for(&self.schema, &self.table) {
            return None;
        }

        match event.decode_message() {
            Ok(message) if message.involves(&self.a, &self.b) => Some(message),
            Ok(_) => None,
            Err(e) => {
                tracing::error!(
                    "[Realtime] Dropping malformed message record: {} ({})",
                    e,
                    event.record
                );
                None
            }
        }
    }
}

async fn listen<F>(
    mut events: mpsc::UnboundedReceiver<InsertEvent>,
    filter: ConversationFilter,
    on_message: F,
) where
    F: Fn(Message) + Send + Sync + 'static,
{
    while let Some(event) = events.recv().await {
        if let Some(message) = filter.accept(&event) {
            tracing::debug!(
                "[Realtime] Delivering message {:?} from {}",
                message.id,
                message.sender
            );
            on_message(message);
        }
    }
    tracing::debug!("[Realtime] Feed ended for conversation {} <-> {}", filter.a, filter.b);
}
