//! Conversation subscription tests against the in-memory backend

use tokio::time::timeout;

use share_everything::backend::memory::Operation;
use share_everything::MessagingError;

use crate::common::*;
use crate::{assert_err, assert_ok};

#[tokio::test]
async fn test_matching_insert_is_delivered_once() {
    init_logging();
    let (_backend, repo) = memory_repository();
    let (callback, mut delivered) = collector();
    let subscription = assert_ok!(repo.subscribe("alice", "bob", callback).await);
    assert!(subscription.is_active());

    let sent = message_at("bob", "alice", "hi there", 42);
    assert_ok!(repo.send(&sent).await);

    let received = assert_ok!(timeout(DELIVERY_TIMEOUT, delivered.recv()).await)
        .expect("message delivered");
    assert_eq!(received.sender, sent.sender);
    assert_eq!(received.receiver, sent.receiver);
    assert_eq!(received.content, sent.content);
    assert_eq!(received.message_type, sent.message_type);
    assert_eq!(received.timestamp, sent.timestamp);
    assert!(received.id.is_some());

    assert!(timeout(SILENCE_TIMEOUT, delivered.recv()).await.is_err());
    repo.unsubscribe(subscription).await;
}

#[tokio::test]
async fn test_other_conversations_are_not_delivered() {
    let (_backend, repo) = memory_repository();
    let (callback, mut delivered) = collector();
    let subscription = assert_ok!(repo.subscribe("alice", "bob", callback).await);

    assert_ok!(repo.send(&message_at("alice", "carol", "not for bob", 1)).await);
    assert_ok!(repo.send(&message_at("carol", "bob", "not for alice", 2)).await);
    assert!(timeout(SILENCE_TIMEOUT, delivered.recv()).await.is_err());

    repo.unsubscribe(subscription).await;
}

#[tokio::test]
async fn test_no_delivery_after_unsubscribe() {
    let (backend, repo) = memory_repository();
    let (callback, mut delivered) = collector();
    let subscription = assert_ok!(repo.subscribe("alice", "bob", callback).await);
    let channel = subscription.channel().clone();

    repo.unsubscribe(subscription).await;
    assert!(channel.is_closed());
    assert_eq!(backend.subscription_count().await, 0);

    assert_ok!(repo.send(&message_at("alice", "bob", "too late", 1)).await);
    let after = assert_ok!(timeout(DELIVERY_TIMEOUT, delivered.recv()).await);
    assert!(after.is_none());
}

#[tokio::test]
async fn test_dropped_subscription_stops_delivery() {
    let (backend, repo) = memory_repository();
    let (callback, mut delivered) = collector();
    let subscription = assert_ok!(repo.subscribe("alice", "bob", callback).await);
    drop(subscription);

    let ended = assert_ok!(timeout(DELIVERY_TIMEOUT, delivered.recv()).await);
    assert!(ended.is_none());
    assert_eq!(backend.subscription_count().await, 0);
}

#[tokio::test]
async fn test_unsubscribe_tolerates_backend_failure() {
    let (backend, repo) = memory_repository();
    let (callback, mut delivered) = collector();
    let subscription = assert_ok!(repo.subscribe("alice", "bob", callback).await);
    let channel = subscription.channel().clone();

    backend.fail_next(Operation::Unsubscribe).await;
    repo.unsubscribe(subscription).await;
    assert!(channel.is_closed());

    assert_ok!(repo.send(&message_at("alice", "bob", "ignored", 1)).await);
    assert!(assert_ok!(timeout(DELIVERY_TIMEOUT, delivered.recv()).await).is_none());
}

#[tokio::test]
async fn test_subscribe_failure_is_returned() {
    let (backend, repo) = memory_repository();
    backend.fail_next(Operation::Subscribe).await;
    let (callback, _delivered) = collector();
    assert_err!(repo.subscribe("alice", "bob", callback).await, MessagingError::Backend(_));
}

#[tokio::test]
async fn test_malformed_insert_is_skipped() {
    use share_everything::BackendClient;

    let (backend, repo) = memory_repository();
    let (callback, mut delivered) = collector();
    let subscription = assert_ok!(repo.subscribe("alice", "bob", callback).await);

    assert_ok!(
        backend
            .insert(
                "messages",
                vec![serde_json::json!({"sender": "alice", "receiver": "bob", "content": "x", "type": "text", "timestamp": "\"5\""})],
            )
            .await
    );
    assert_ok!(repo.send(&message_at("alice", "bob", "valid", 6)).await);

    let received = assert_ok!(timeout(DELIVERY_TIMEOUT, delivered.recv()).await)
        .expect("valid message delivered");
    assert_eq!(received.content, "valid");

    repo.unsubscribe(subscription).await;
}
