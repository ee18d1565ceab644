//! Realtime channel handles
//!
//! A [`RealtimeChannel`] identifies one open subscription. Cloning the
//! handle is cheap; closing any clone closes the subscription for all of
//! them. The listener side keeps a [`StopSignal`] and ends as soon as the
//! channel is closed.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::shared::InsertEvent;

/// Handle to an open realtime subscription
#[derive(Debug, Clone)]
pub struct RealtimeChannel {
    id: Uuid,
    topic: String,
    stop: Arc<watch::Sender<bool>>,
}

impl RealtimeChannel {
    /// Create a new open channel and the stop signal its listener watches
    pub fn open(topic: impl Into<String>) -> (Self, StopSignal) {
        let (tx, rx) = watch::channel(false);
        let channel = Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            stop: Arc::new(tx),
        };
        (channel, StopSignal { rx })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_closed(&self) -> bool {
        *self.stop.borrow()
    }

    /// Close the channel; returns `false` if it was already closed
    pub fn close(&self) -> bool {
        !self.stop.send_replace(true)
    }
}

impl PartialEq for RealtimeChannel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RealtimeChannel {}

/// Listener side of a channel's close flag
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Whether the channel was closed or every handle to it dropped
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once the channel is closed (or every handle is dropped)
    pub async fn stopped(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// An open subscription and the insert events it delivers
///
/// Events arrive in the order the backend emits them; the queue is
/// unbounded and nothing is deduplicated.
#[derive(Debug)]
pub struct ChangeFeed {
    pub channel: RealtimeChannel,
    pub events: mpsc::UnboundedReceiver<InsertEvent>,
}
