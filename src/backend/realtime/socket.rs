/**
 * Realtime Socket
 *
 * Opens a websocket to the realtime service, joins one topic for INSERT
 * changes on a table and forwards every change as an `InsertEvent`.
 *
 * # Connection Management
 *
 * - The join is confirmed before `subscribe` returns, so inserts committed
 *   after that point are delivered
 * - A heartbeat is sent every `heartbeat_interval_secs`
 * - Closing the `RealtimeChannel` sends `phx_leave` and closes the socket
 * - A server-side close or socket error ends the feed; there is no
 *   reconnect
 */
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::backend::error::BackendError;
use crate::backend::realtime::channel::{ChangeFeed, RealtimeChannel, StopSignal};
use crate::backend::realtime::protocol::{parse_frame, PhoenixMessage, RealtimeFrame};
use crate::shared::{AppConfig, InsertEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a realtime subscription for INSERTs on `schema.table`
pub async fn subscribe(
    config: &AppConfig,
    topic: &str,
    schema: &str,
    table: &str,
) -> Result<ChangeFeed, BackendError> {
    let url = config.realtime_url()?;
    tracing::info!("[Realtime] Connecting to {} for {}.{}", url.path(), schema, table);

    let (mut socket, _response) = connect_async(url.as_str()).await?;

    let join_ref = 1;
    send_frame(&mut socket, &PhoenixMessage::join(topic, schema, table, join_ref)).await?;
    await_join(&mut socket, join_ref).await?;
    tracing::info!("[Realtime] Joined {}", topic);

    let (channel, stop) = RealtimeChannel::open(topic);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let heartbeat = Duration::from_secs(config.heartbeat_interval_secs);

    tokio::spawn(run(socket, topic.to_string(), join_ref + 1, heartbeat, stop, events_tx));

    Ok(ChangeFeed {
        channel,
        events: events_rx,
    })
}

async fn send_frame(socket: &mut Socket, frame: &PhoenixMessage) -> Result<(), BackendError> {
    let text = serde_json::to_string(frame)?;
    socket.send(WsMessage::Text(text)).await?;
    Ok(())
}

/// Read frames until the reply to our join arrives
async fn await_join(socket: &mut Socket, join_ref: u64) -> Result<(), BackendError> {
    let expected = join_ref.to_string();
    while let Some(frame) = socket.next().await {
        let text = match frame? {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };

        match parse_frame(&text) {
            Ok(RealtimeFrame::Reply { reference, ok, reason })
                if reference.as_deref() == Some(expected.as_str()) =>
            {
                if ok {
                    return Ok(());
                }
                return Err(BackendError::realtime(format!(
                    "join rejected: {}",
                    reason.unwrap_or_else(|| "no reason given".to_string())
                )));
            }
            Ok(RealtimeFrame::Closed { reason }) => {
                return Err(BackendError::realtime(format!(
                    "channel closed during join: {}",
                    reason.unwrap_or_default()
                )));
            }
            Ok(_) => continue,
            Err(e) => tracing::warn!("[Realtime] Ignoring unparsable frame during join: {}", e),
        }
    }
    Err(BackendError::realtime("socket closed before join was confirmed"))
}

async fn run(
    mut socket: Socket,
    topic: String,
    mut next_ref: u64,
    heartbeat: Duration,
    mut stop: StopSignal,
    events: mpsc::UnboundedSender<InsertEvent>,
) {
    let mut ticker = tokio::time::interval(heartbeat);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stop.stopped() => {
                tracing::info!("[Realtime] Leaving {}", topic);
                let leave = PhoenixMessage::leave(&topic, next_ref);
                if let Err(e) = send_frame(&mut socket, &leave).await {
                    tracing::warn!("[Realtime] Failed to send leave for {}: {}", topic, e);
                }
                let _ = socket.close(None).await;
                break;
            }
            _ = ticker.tick() => {
                let heartbeat = PhoenixMessage::heartbeat(next_ref);
                if let Err(e) = send_frame(&mut socket, &heartbeat).await {
                    tracing::error!("[Realtime] Heartbeat failed on {}: {}", topic, e);
                    break;
                }
                next_ref += 1;
            }
            frame = socket.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => {
                        tracing::warn!("[Realtime] Socket closed by server on {}", topic);
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::error!("[Realtime] Socket error on {}: {}", topic, e);
                        break;
                    }
                };

                match parse_frame(&text) {
                    Ok(RealtimeFrame::Insert(event)) => {
                        tracing::debug!("[Realtime] Insert on {}.{}", event.schema, event.table);
                        if events.send(event).is_err() {
                            tracing::debug!("[Realtime] Feed receiver dropped, leaving {}", topic);
                            break;
                        }
                    }
                    Ok(RealtimeFrame::Reply { ok: false, reason, .. }) => {
                        tracing::warn!("[Realtime] Request rejected on {}: {:?}", topic, reason);
                    }
                    Ok(RealtimeFrame::Closed { reason }) => {
                        tracing::warn!(
                            "[Realtime] Channel {} closed by server: {:?}",
                            topic,
                            reason
                        );
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("[Realtime] Malformed frame on {}: {}", topic, e),
                }
            }
        }
    }
}
