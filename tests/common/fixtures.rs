//! Repository and configuration fixtures

use std::sync::Arc;
use std::time::Duration;

use share_everything::{AppConfig, MemoryBackend, Message, MessageRepository};
use tokio::sync::mpsc;

pub const TEST_API_KEY: &str = "test-key";

/// How long to wait for an event that should arrive
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait before concluding an event will not arrive
pub const SILENCE_TIMEOUT: Duration = Duration::from_millis(200);

/// Valid config pointing at `url`
pub fn test_config(url: &str) -> AppConfig {
    AppConfig::builder()
        .supabase_url(url)
        .api_key(TEST_API_KEY)
        .build()
        .expect("test config should be valid")
}

/// Repository over a fresh in-memory backend
pub fn memory_repository() -> (MemoryBackend, MessageRepository) {
    let backend = MemoryBackend::new();
    let repo = MessageRepository::new(Arc::new(backend.clone()), test_config("http://localhost:54321"));
    (backend, repo)
}

/// Text message with a fixed timestamp
pub fn message_at(sender: &str, receiver: &str, content: &str, timestamp: i64) -> Message {
    Message::new(sender, receiver, content, "text", timestamp)
}

/// Callback that forwards delivered messages to a channel
pub fn collector() -> (impl Fn(Message) + Send + Sync + 'static, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = move |message: Message| {
        let _ = tx.send(message);
    };
    (callback, rx)
}

/// Enable log output for a test run
pub fn init_logging() {
    share_everything::logging::init_tracing("share_everything=debug");
}
