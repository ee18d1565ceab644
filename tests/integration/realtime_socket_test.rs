//! Realtime websocket tests against a local Phoenix-style server

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

use share_everything::{AppConfig, BackendError, MessageRepository, MessagingError};

use crate::common::*;
use crate::{assert_err, assert_ok};

fn insert_frame(sender: &str, receiver: &str, id: i64) -> String {
    json!({
        "topic": "realtime:public:messages",
        "event": "postgres_changes",
        "ref": null,
        "payload": {
            "ids": [id],
            "data": {
                "type": "INSERT",
                "schema": "public",
                "table": "messages",
                "commit_timestamp": "2024-05-01T12:00:00Z",
                "record": {
                    "id": id,
                    "sender": sender,
                    "receiver": receiver,
                    "content": format!("message {}", id),
                    "type": "text",
                    "timestamp": 1000 + id,
                    "created_at": "2024-05-01T12:00:00+00:00"
                }
            }
        }
    })
    .to_string()
}

fn reply_frame(reference: &str, status: &str) -> String {
    json!({
        "topic": "realtime:public:messages",
        "event": "phx_reply",
        "ref": reference,
        "payload": {"status": status, "response": {"reason": "not allowed"}}
    })
    .to_string()
}

/// Accept one websocket and answer its join with `join_status`
async fn accept_join(
    listener: TcpListener,
    join_status: &'static str,
) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.expect("accept");
    let mut socket = tokio_tungstenite::accept_async(stream).await.expect("handshake");

    let join = match socket.next().await {
        Some(Ok(WsMessage::Text(text))) => {
            serde_json::from_str::<Value>(&text).expect("join json")
        }
        other => panic!("expected join frame, got {:?}", other),
    };
    assert_eq!(join["event"], "phx_join");
    assert_eq!(join["payload"]["config"]["postgres_changes"][0]["event"], "INSERT");
    let reference = join["ref"].as_str().unwrap_or_default().to_string();
    socket
        .send(WsMessage::Text(reply_frame(&reference, join_status)))
        .await
        .expect("send reply");
    socket
}

/// Next text frame whose event is `event`
async fn next_event(socket: &mut WebSocketStream<TcpStream>, event: &str) -> Option<Value> {
    while let Some(Ok(message)) = socket.next().await {
        if let WsMessage::Text(text) = message {
            let frame: Value = serde_json::from_str(&text).expect("frame json");
            if frame["event"] == event {
                return Some(frame);
            }
        }
    }
    None
}

/// Serve one connection: answer the join, push `frames`, then report the
/// first leave request
async fn serve_once(
    join_status: &'static str,
    frames: Vec<String>,
) -> (String, oneshot::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    let (left_tx, left_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut socket = accept_join(listener, join_status).await;
        for frame in frames {
            socket.send(WsMessage::Text(frame)).await.expect("send frame");
        }
        if let Some(frame) = next_event(&mut socket, "phx_leave").await {
            let _ = left_tx.send(frame);
        }
    });

    (format!("http://{}", address), left_rx)
}

/// Serve one connection: answer the join, report the first heartbeat, then
/// close the channel from the server side
async fn serve_heartbeat_then_close() -> (String, oneshot::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    let (beat_tx, beat_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut socket = accept_join(listener, "ok").await;
        if let Some(frame) = next_event(&mut socket, "heartbeat").await {
            let _ = beat_tx.send(frame);
        }

        let close = json!({
            "topic": "realtime:public:messages",
            "event": "phx_close",
            "ref": null,
            "payload": {}
        });
        let _ = socket.send(WsMessage::Text(close.to_string())).await;
        while let Some(Ok(_)) = socket.next().await {}
    });

    (format!("http://{}", address), beat_rx)
}

#[tokio::test]
async fn test_subscription_over_websocket() {
    init_logging();
    let frames = vec![insert_frame("alice", "carol", 1), insert_frame("bob", "alice", 2)];
    let (url, left) = serve_once("ok", frames).await;
    let repo = assert_ok!(MessageRepository::connect(test_config(&url)));

    let (callback, mut delivered) = collector();
    let subscription = assert_ok!(repo.subscribe("alice", "bob", callback).await);

    let received = assert_ok!(timeout(DELIVERY_TIMEOUT, delivered.recv()).await)
        .expect("message delivered");
    assert_eq!(received.id, Some(2));
    assert_eq!(received.sender, "bob");
    assert_eq!(received.timestamp, 1002);
    assert!(timeout(SILENCE_TIMEOUT, delivered.recv()).await.is_err());

    repo.unsubscribe(subscription).await;
    let leave = assert_ok!(assert_ok!(timeout(DELIVERY_TIMEOUT, left).await));
    assert_eq!(leave["topic"], "realtime:public:messages");
}

#[tokio::test]
async fn test_heartbeat_then_server_close_ends_subscription() {
    let (url, heartbeat) = serve_heartbeat_then_close().await;
    let config = assert_ok!(AppConfig::builder()
        .supabase_url(url)
        .api_key(TEST_API_KEY)
        .heartbeat_interval_secs(1)
        .build());
    let repo = assert_ok!(MessageRepository::connect(config));

    let (callback, mut delivered) = collector();
    let subscription = assert_ok!(repo.subscribe("alice", "bob", callback).await);
    assert!(subscription.is_active());

    let beat = assert_ok!(assert_ok!(timeout(Duration::from_secs(5), heartbeat).await));
    assert_eq!(beat["topic"], "phoenix");
    assert_eq!(beat["event"], "heartbeat");
    assert!(beat["ref"].is_string());

    // The feed ends once the server closes the channel, which drops the callback.
    let ended = assert_ok!(timeout(DELIVERY_TIMEOUT, delivered.recv()).await);
    assert!(ended.is_none());

    let stopped = timeout(DELIVERY_TIMEOUT, async {
        while subscription.is_active() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(stopped.is_ok());

    repo.unsubscribe(subscription).await;
}

#[tokio::test]
async fn test_rejected_join_is_an_error() {
    let (url, _left) = serve_once("error", vec![]).await;
    let repo = assert_ok!(MessageRepository::connect(test_config(&url)));

    let (callback, _delivered) = collector();
    assert_err!(
        repo.subscribe("alice", "bob", callback).await,
        MessagingError::Backend(BackendError::RealtimeError { .. })
    );
}

#[tokio::test]
async fn test_unreachable_realtime_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    drop(listener);

    let repo = assert_ok!(MessageRepository::connect(test_config(&format!("http://{}", address))));
    let (callback, _delivered) = collector();
    assert_err!(repo.subscribe("alice", "bob", callback).await, MessagingError::Backend(_));
}
